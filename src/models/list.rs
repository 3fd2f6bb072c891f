use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A named to-do list owned by one user. `(name, user_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /list`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    #[validate(required(message = "name is required"))]
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
}

/// Payload for `PATCH /list`: rename and/or soft-delete the list identified by `id`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListRequest {
    #[validate(required(message = "id is required"))]
    pub id: Option<i32>,

    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    pub is_deleted: Option<bool>,
}

impl List {
    pub fn apply(&mut self, update: UpdateListRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(is_deleted) = update.is_deleted {
            self.is_deleted = is_deleted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_name_validation() {
        let missing = CreateListRequest { name: None };
        assert!(missing.validate().is_err());

        let empty = CreateListRequest {
            name: Some(String::new()),
        };
        assert!(empty.validate().is_err());

        let too_long = CreateListRequest {
            name: Some("l".repeat(101)),
        };
        assert!(too_long.validate().is_err());

        let valid = CreateListRequest {
            name: Some("Groceries".to_string()),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_update_requires_id() {
        let update: UpdateListRequest =
            serde_json::from_value(serde_json::json!({ "name": "Chores" })).unwrap();
        assert!(update.validate().is_err());

        let update: UpdateListRequest =
            serde_json::from_value(serde_json::json!({ "id": 4, "isDeleted": true })).unwrap();
        assert!(update.validate().is_ok());

        let mut list = List {
            id: 4,
            name: "Chores".to_string(),
            user_id: 1,
            is_deleted: false,
            created_at: Utc::now(),
        };
        list.apply(update);
        assert!(list.is_deleted);
        assert_eq!(list.name, "Chores");
    }
}
