use actix_web::{get, patch, post, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateListRequest, UpdateListRequest},
    state::AppState,
};

/// Lists of the caller, soft-deleted ones excluded.
#[get("")]
pub async fn get_lists(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let lists = state.lists.lists_by_owner(user.id()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "lists": lists,
        "message": "Lists retrieved successfully",
    })))
}

/// Creates a list. Names are unique per owner (409 otherwise).
#[post("")]
pub async fn create_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateListRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let name = body
        .into_inner()
        .name
        .ok_or_else(|| AppError::BadRequest("name is required".into()))?;

    let list = state.lists.create_list(&name, user.id()).await?;

    Ok(HttpResponse::Created().json(json!({
        "list": list,
        "message": "List created successfully",
    })))
}

/// Renames and/or soft-deletes one of the caller's lists.
#[patch("")]
pub async fn update_list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<UpdateListRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let update = body.into_inner();
    let id = update
        .id
        .ok_or_else(|| AppError::BadRequest("id is required".into()))?;

    let mut list = state
        .lists
        .find_owned_list(id, user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".into()))?;
    list.apply(update);
    let list = state.lists.update_list(&list).await?;

    Ok(HttpResponse::Ok().json(json!({
        "list": list,
        "message": "List updated successfully",
    })))
}

/// Tasks of one of the caller's lists.
#[get("/{id}/tasks")]
pub async fn get_list_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let list = state
        .lists
        .find_owned_list(path.into_inner(), user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".into()))?;

    let tasks = state.tasks.tasks_by_list(list.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "tasks": tasks,
        "message": "Tasks retrieved successfully",
    })))
}
