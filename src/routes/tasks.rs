use actix_web::{patch, post, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, NewTask, UpdateTaskRequest},
    state::AppState,
};

/// Creates a task in one of the caller's lists.
///
/// ## Responses:
/// - `201 Created`: `{task, message}`.
/// - `400 Bad Request`: every missing or out-of-bounds field is listed.
/// - `403 Forbidden`: no valid access token.
/// - `404 Not Found`: `listId` is not one of the caller's lists.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let new_task = NewTask::try_from(body.into_inner())?;

    state
        .lists
        .find_owned_list(new_task.list_id, user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".into()))?;

    let task = state.tasks.create_task(new_task).await?;

    Ok(HttpResponse::Created().json(json!({
        "task": task,
        "message": "Task created successfully",
    })))
}

/// Partially updates one of the caller's tasks. Setting `isDeleted` soft-deletes it.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let mut task = state
        .tasks
        .find_owned_task(path.into_inner(), user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    task.apply(body.into_inner());
    let task = state.tasks.update_task(&task).await?;

    Ok(HttpResponse::Ok().json(json!({
        "task": task,
        "message": "Task updated successfully",
    })))
}
