use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{ListStore, RefreshTokenStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{
    List, NewTask, NewUser, RefreshTokenRecord, RefreshTokenStatus, StoredRefreshToken, Task,
    User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshTokenRecord>,
    lists: Vec<List>,
    tasks: Vec<Task>,
    next_refresh_token_id: i32,
}

/// In-process store with the same uniqueness and visibility rules as the
/// Postgres schema. All tables sit behind one async mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn soft_delete_user(&self, id: i32) {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.is_deleted = true;
        }
    }
}

fn list_is_owned(tables: &Tables, list_id: i32, user_id: i32) -> bool {
    tables
        .lists
        .iter()
        .any(|l| l.id == list_id && l.user_id == user_id && !l.is_deleted)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email is already in use".into()));
        }
        let created = User {
            id: tables.users.len() as i32 + 1,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            surname: user.surname,
            is_deleted: false,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email && !u.is_deleted)
            .cloned())
    }

    async fn find_active_by_id(&self, id: i32) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id && !u.is_deleted)
            .cloned())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn save(
        &self,
        token: &str,
        owner: &User,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshTokenRecord> {
        let mut tables = self.tables.lock().await;
        if tables.refresh_tokens.iter().any(|r| r.token == token) {
            return Err(StoreError::Conflict("Refresh token already stored".into()));
        }
        tables.next_refresh_token_id += 1;
        let record = RefreshTokenRecord {
            id: tables.next_refresh_token_id,
            token: token.to_string(),
            user_id: owner.id,
            status: RefreshTokenStatus::Active,
            created_at: Utc::now(),
            expires_at,
            deactivated_at: None,
        };
        tables.refresh_tokens.push(record.clone());
        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<StoredRefreshToken>> {
        let tables = self.tables.lock().await;
        let stored = tables
            .refresh_tokens
            .iter()
            .find(|r| r.token == token && r.is_active())
            .and_then(|record| {
                let owner = tables.users.iter().find(|u| u.id == record.user_id)?;
                Some(StoredRefreshToken {
                    record: record.clone(),
                    owner: owner.clone(),
                })
            });
        Ok(stored)
    }

    async fn deactivate(&self, record: &RefreshTokenRecord) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables
            .refresh_tokens
            .iter_mut()
            .find(|r| r.id == record.id && r.is_active())
        {
            Some(stored) => {
                stored.status = RefreshTokenStatus::Deactivated;
                stored.deactivated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, token: &str) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|r| r.token != token);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn list_for_user(&self, user_id: i32) -> StoreResult<Vec<RefreshTokenRecord>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<_> = tables
            .refresh_tokens
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn create_list(&self, name: &str, user_id: i32) -> StoreResult<List> {
        let mut tables = self.tables.lock().await;
        if tables
            .lists
            .iter()
            .any(|l| l.name == name && l.user_id == user_id)
        {
            return Err(StoreError::Conflict(
                "A list with this name already exists".into(),
            ));
        }
        let list = List {
            id: tables.lists.len() as i32 + 1,
            name: name.to_string(),
            user_id,
            is_deleted: false,
            created_at: Utc::now(),
        };
        tables.lists.push(list.clone());
        Ok(list)
    }

    async fn lists_by_owner(&self, user_id: i32) -> StoreResult<Vec<List>> {
        let tables = self.tables.lock().await;
        let mut lists: Vec<_> = tables
            .lists
            .iter()
            .filter(|l| l.user_id == user_id && !l.is_deleted)
            .cloned()
            .collect();
        // Newest first, like the Postgres query.
        lists.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(lists)
    }

    async fn find_owned_list(&self, id: i32, user_id: i32) -> StoreResult<Option<List>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lists
            .iter()
            .find(|l| l.id == id && l.user_id == user_id && !l.is_deleted)
            .cloned())
    }

    async fn update_list(&self, list: &List) -> StoreResult<List> {
        let mut tables = self.tables.lock().await;
        if tables
            .lists
            .iter()
            .any(|l| l.id != list.id && l.name == list.name && l.user_id == list.user_id)
        {
            return Err(StoreError::Conflict(
                "A list with this name already exists".into(),
            ));
        }
        let stored = tables
            .lists
            .iter_mut()
            .find(|l| l.id == list.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        stored.name = list.name.clone();
        stored.is_deleted = list.is_deleted;
        Ok(stored.clone())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let mut tables = self.tables.lock().await;
        let created = Task {
            id: tables.tasks.len() as i32 + 1,
            short_desc: task.short_desc,
            long_desc: task.long_desc,
            deadline: task.deadline,
            is_achieved: false,
            is_deleted: false,
            created_at: Utc::now(),
            list_id: task.list_id,
        };
        tables.tasks.push(created.clone());
        Ok(created)
    }

    async fn tasks_by_list(&self, list_id: i32) -> StoreResult<Vec<Task>> {
        let tables = self.tables.lock().await;
        let mut tasks: Vec<_> = tables
            .tasks
            .iter()
            .filter(|t| t.list_id == list_id && !t.is_deleted)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.deadline);
        Ok(tasks)
    }

    async fn find_owned_task(&self, id: i32, user_id: i32) -> StoreResult<Option<Task>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == id && !t.is_deleted && list_is_owned(&tables, t.list_id, user_id))
            .cloned())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        stored.short_desc = task.short_desc.clone();
        stored.long_desc = task.long_desc.clone();
        stored.deadline = task.deadline;
        stored.is_achieved = task.is_achieved;
        stored.is_deleted = task.is_deleted;
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seeded_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "digest".to_string(),
                name: "A".to_string(),
                surname: "B".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let store = MemoryStore::new();
        seeded_user(&store, "a@b.com").await;

        let duplicate = store
            .create_user(NewUser {
                email: "a@b.com".to_string(),
                password_hash: "other".to_string(),
                name: "C".to_string(),
                surname: "D".to_string(),
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_deactivated_token_no_longer_matches() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "a@b.com").await;
        let record = store
            .save("tok", &user, Utc::now() + Duration::days(7))
            .await
            .unwrap();

        let found = store.find_by_token("tok").await.unwrap().unwrap();
        assert_eq!(found.owner.id, user.id);

        assert!(store.deactivate(&record).await.unwrap());
        assert!(!store.deactivate(&record).await.unwrap());
        assert!(store.find_by_token("tok").await.unwrap().is_none());

        let audit = store.list_for_user(user.id).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].status, RefreshTokenStatus::Deactivated);
        assert!(audit[0].deactivated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "a@b.com").await;
        store
            .save("tok", &user, Utc::now() + Duration::days(7))
            .await
            .unwrap();

        assert_eq!(store.delete("tok").await.unwrap(), 1);
        assert_eq!(store.delete("tok").await.unwrap(), 0);
        assert!(store.list_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_names_unique_per_owner() {
        let store = MemoryStore::new();
        let a = seeded_user(&store, "a@b.com").await;
        let b = seeded_user(&store, "b@b.com").await;

        store.create_list("Groceries", a.id).await.unwrap();
        store.create_list("Groceries", b.id).await.unwrap();
        assert!(matches!(
            store.create_list("Groceries", a.id).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_task_ownership_follows_list() {
        let store = MemoryStore::new();
        let a = seeded_user(&store, "a@b.com").await;
        let b = seeded_user(&store, "b@b.com").await;
        let list = store.create_list("Chores", a.id).await.unwrap();
        let task = store
            .create_task(NewTask {
                short_desc: "Dishes".to_string(),
                long_desc: String::new(),
                deadline: Utc::now(),
                list_id: list.id,
            })
            .await
            .unwrap();

        assert!(store.find_owned_task(task.id, a.id).await.unwrap().is_some());
        assert!(store.find_owned_task(task.id, b.id).await.unwrap().is_none());

        let mut deleted = task.clone();
        deleted.is_deleted = true;
        store.update_task(&deleted).await.unwrap();
        assert!(store.tasks_by_list(list.id).await.unwrap().is_empty());
        assert!(store.find_owned_task(task.id, a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tasks_come_back_soonest_deadline_first() {
        let store = MemoryStore::new();
        let a = seeded_user(&store, "a@b.com").await;
        let list = store.create_list("Chores", a.id).await.unwrap();
        let now = Utc::now();
        for (desc, offset) in [("Later", 3), ("Soonest", 1), ("Middle", 2)] {
            store
                .create_task(NewTask {
                    short_desc: desc.to_string(),
                    long_desc: String::new(),
                    deadline: now + Duration::days(offset),
                    list_id: list.id,
                })
                .await
                .unwrap();
        }

        let order: Vec<_> = store
            .tasks_by_list(list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.short_desc)
            .collect();
        assert_eq!(order, vec!["Soonest", "Middle", "Later"]);
    }

    #[tokio::test]
    async fn test_lists_come_back_newest_first() {
        let store = MemoryStore::new();
        let a = seeded_user(&store, "a@b.com").await;
        let first = store.create_list("First", a.id).await.unwrap();
        let second = store.create_list("Second", a.id).await.unwrap();

        let ids: Vec<_> = store
            .lists_by_owner(a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
