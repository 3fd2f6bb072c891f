use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task.
    pub id: i32,
    /// One-line summary of the task.
    pub short_desc: String,
    /// Free-form details. Empty when not provided.
    pub long_desc: String,
    /// When the task is due.
    pub deadline: DateTime<Utc>,
    /// Whether the task has been completed.
    pub is_achieved: bool,
    /// Soft-delete flag; deleted tasks are hidden from every read.
    pub is_deleted: bool,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// The list this task belongs to. Ownership of a task is ownership of its list.
    pub list_id: i32,
}

/// Fields required to insert a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub short_desc: String,
    pub long_desc: String,
    pub deadline: DateTime<Utc>,
    pub list_id: i32,
}

/// Payload for `POST /task`.
///
/// Required fields are `Option`s so that a body missing several of them is
/// reported field by field instead of failing on the first one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(required(message = "shortDesc is required"))]
    #[validate(length(
        min = 3,
        max = 255,
        message = "shortDesc must be between 3 and 255 characters"
    ))]
    pub short_desc: Option<String>,

    #[validate(length(max = 1000, message = "longDesc must be at most 1000 characters"))]
    pub long_desc: Option<String>,

    #[validate(required(message = "deadline is required"))]
    pub deadline: Option<DateTime<Utc>>,

    #[validate(required(message = "listId is required"))]
    #[validate(range(min = 1, message = "listId must be a positive integer"))]
    pub list_id: Option<i32>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = AppError;

    /// Expects a request that already passed `validate()`.
    fn try_from(request: CreateTaskRequest) -> Result<Self, Self::Error> {
        match (request.short_desc, request.deadline, request.list_id) {
            (Some(short_desc), Some(deadline), Some(list_id)) => Ok(NewTask {
                short_desc,
                long_desc: request.long_desc.unwrap_or_default(),
                deadline,
                list_id,
            }),
            _ => Err(AppError::BadRequest(
                "shortDesc, deadline and listId are required".into(),
            )),
        }
    }
}

/// Payload for `PATCH /task/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(
        min = 3,
        max = 255,
        message = "shortDesc must be between 3 and 255 characters"
    ))]
    pub short_desc: Option<String>,

    #[validate(length(max = 1000, message = "longDesc must be at most 1000 characters"))]
    pub long_desc: Option<String>,

    pub deadline: Option<DateTime<Utc>>,

    pub is_achieved: Option<bool>,

    pub is_deleted: Option<bool>,
}

impl Task {
    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: UpdateTaskRequest) {
        if let Some(short_desc) = update.short_desc {
            self.short_desc = short_desc;
        }
        if let Some(long_desc) = update.long_desc {
            self.long_desc = long_desc;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = deadline;
        }
        if let Some(is_achieved) = update.is_achieved {
            self.is_achieved = is_achieved;
        }
        if let Some(is_deleted) = update.is_deleted {
            self.is_deleted = is_deleted;
        }
    }
}
