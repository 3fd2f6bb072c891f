use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{ListStore, RefreshTokenStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{
    List, NewTask, NewUser, RefreshTokenRecord, RefreshTokenStatus, StoredRefreshToken, Task,
    User,
};

const USER_COLUMNS: &str = "id, email, password_hash, name, surname, is_deleted, created_at";
const REFRESH_TOKEN_COLUMNS: &str =
    "id, token, user_id, status, created_at, expires_at, deactivated_at";
const LIST_COLUMNS: &str = "id, name, user_id, is_deleted, created_at";
const TASK_COLUMNS: &str =
    "id, short_desc, long_desc, deadline, is_achieved, is_deleted, created_at, list_id";

/// Postgres-backed implementation of every store trait.
///
/// Queries are checked at runtime (`query_as::<_, T>`) so the crate builds
/// without a live database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to `StoreError::Conflict`.
fn conflict_as(what: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |error| match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(what.to_string())
        }
        _ => StoreError::Database(error),
    }
}

/// One row of the refresh-token/owner join.
#[derive(FromRow)]
struct RefreshTokenWithOwnerRow {
    id: i32,
    token: String,
    user_id: i32,
    status: RefreshTokenStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    deactivated_at: Option<DateTime<Utc>>,
    owner_email: String,
    owner_password_hash: String,
    owner_name: String,
    owner_surname: String,
    owner_is_deleted: bool,
    owner_created_at: DateTime<Utc>,
}

impl From<RefreshTokenWithOwnerRow> for StoredRefreshToken {
    fn from(row: RefreshTokenWithOwnerRow) -> Self {
        StoredRefreshToken {
            owner: User {
                id: row.user_id,
                email: row.owner_email,
                password_hash: row.owner_password_hash,
                name: row.owner_name,
                surname: row.owner_surname,
                is_deleted: row.owner_is_deleted,
                created_at: row.owner_created_at,
            },
            record: RefreshTokenRecord {
                id: row.id,
                token: row.token,
                user_id: row.user_id,
                status: row.status,
                created_at: row.created_at,
                expires_at: row.expires_at,
                deactivated_at: row.deactivated_at,
            },
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name, surname) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.surname)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_as("Email is already in use"))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_deleted = FALSE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_active_by_id(&self, id: i32) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn save(
        &self,
        token: &str,
        owner: &User,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING {REFRESH_TOKEN_COLUMNS}"
        ))
        .bind(token)
        .bind(owner.id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_as("Refresh token already stored"))
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<StoredRefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenWithOwnerRow>(
            "SELECT t.id, t.token, t.user_id, t.status, t.created_at, t.expires_at, t.deactivated_at, \
                    u.email AS owner_email, u.password_hash AS owner_password_hash, \
                    u.name AS owner_name, u.surname AS owner_surname, \
                    u.is_deleted AS owner_is_deleted, u.created_at AS owner_created_at \
             FROM refresh_tokens t \
             JOIN users u ON u.id = t.user_id \
             WHERE t.token = $1 AND t.status = 'active'",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredRefreshToken::from))
    }

    async fn deactivate(&self, record: &RefreshTokenRecord) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET status = 'deactivated', deactivated_at = NOW() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, token: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: i32) -> StoreResult<Vec<RefreshTokenRecord>> {
        let records = sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[async_trait]
impl ListStore for PgStore {
    async fn create_list(&self, name: &str, user_id: i32) -> StoreResult<List> {
        sqlx::query_as::<_, List>(&format!(
            "INSERT INTO lists (name, user_id) VALUES ($1, $2) RETURNING {LIST_COLUMNS}"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_as("A list with this name already exists"))
    }

    async fn lists_by_owner(&self, user_id: i32) -> StoreResult<Vec<List>> {
        let lists = sqlx::query_as::<_, List>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE user_id = $1 AND is_deleted = FALSE \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    async fn find_owned_list(&self, id: i32, user_id: i32) -> StoreResult<Option<List>> {
        let list = sqlx::query_as::<_, List>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    async fn update_list(&self, list: &List) -> StoreResult<List> {
        sqlx::query_as::<_, List>(&format!(
            "UPDATE lists SET name = $1, is_deleted = $2 WHERE id = $3 AND user_id = $4 \
             RETURNING {LIST_COLUMNS}"
        ))
        .bind(&list.name)
        .bind(list.is_deleted)
        .bind(list.id)
        .bind(list.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_as("A list with this name already exists"))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (short_desc, long_desc, deadline, list_id) VALUES ($1, $2, $3, $4) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.short_desc)
        .bind(&task.long_desc)
        .bind(task.deadline)
        .bind(task.list_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn tasks_by_list(&self, list_id: i32) -> StoreResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE list_id = $1 AND is_deleted = FALSE \
             ORDER BY deadline ASC"
        ))
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn find_owned_task(&self, id: i32, user_id: i32) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT t.id, t.short_desc, t.long_desc, t.deadline, t.is_achieved, t.is_deleted, \
                    t.created_at, t.list_id \
             FROM tasks t \
             JOIN lists l ON l.id = t.list_id \
             WHERE t.id = $1 AND l.user_id = $2 AND t.is_deleted = FALSE AND l.is_deleted = FALSE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks \
             SET short_desc = $1, long_desc = $2, deadline = $3, is_achieved = $4, is_deleted = $5 \
             WHERE id = $6 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.short_desc)
        .bind(&task.long_desc)
        .bind(task.deadline)
        .bind(task.is_achieved)
        .bind(task.is_deleted)
        .bind(task.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }
}
