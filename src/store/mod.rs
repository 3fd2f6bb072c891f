//! Persistence seams.
//!
//! Every collaborator the session use-case and the list/task handlers need is a
//! `Send + Sync` trait so that the concrete backend is chosen once, in `main`,
//! and injected through [`crate::state::AppState`]. [`PgStore`] is the
//! production backend; [`MemoryStore`] enforces the same constraints in
//! process and backs the test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{List, NewTask, NewUser, RefreshTokenRecord, StoredRefreshToken, Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Any user with this email, soft-deleted or not.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_active_by_id(&self, id: i32) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn save(
        &self,
        token: &str,
        owner: &User,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord>;

    /// Looks up an *active* record by its token string and loads its owner.
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<StoredRefreshToken>>;

    /// Moves the record from `Active` to `Deactivated`.
    ///
    /// Returns `false` when the record was no longer active, i.e. a concurrent
    /// caller already deactivated or deleted it.
    async fn deactivate(&self, record: &RefreshTokenRecord) -> StoreResult<bool>;

    /// Hard-removes the record holding `token`. Returns the number of rows removed.
    async fn delete(&self, token: &str) -> StoreResult<u64>;

    /// Every record of a user, deactivated ones included, newest first.
    async fn list_for_user(&self, user_id: i32) -> StoreResult<Vec<RefreshTokenRecord>>;
}

#[async_trait]
pub trait ListStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the owner already has a list with this name.
    async fn create_list(&self, name: &str, user_id: i32) -> StoreResult<List>;
    async fn lists_by_owner(&self, user_id: i32) -> StoreResult<Vec<List>>;
    /// A non-deleted list, only if it belongs to `user_id`.
    async fn find_owned_list(&self, id: i32, user_id: i32) -> StoreResult<Option<List>>;
    async fn update_list(&self, list: &List) -> StoreResult<List>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn tasks_by_list(&self, list_id: i32) -> StoreResult<Vec<Task>>;
    /// A non-deleted task whose (non-deleted) list belongs to `user_id`.
    async fn find_owned_task(&self, id: i32, user_id: i32) -> StoreResult<Option<Task>>;
    async fn update_task(&self, task: &Task) -> StoreResult<Task>;
}
