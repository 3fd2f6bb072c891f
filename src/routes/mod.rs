pub mod auth;
pub mod health;
pub mod lists;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Malformed JSON bodies answer 400 in the same `{"error": ...}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid JSON payload: {}", err)).into()
    })
}

/// Path segments that fail to parse (`/task/abc`, an id past `i32::MAX`) name
/// no resource, so they answer 404 with a JSON body.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::NotFound(format!("Invalid path parameter: {}", err)).into()
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(auth::signup)
        .service(auth::login)
        .service(auth::refresh_token)
        .service(auth::auth_refresh)
        .service(auth::logout)
        .service(
            web::scope("/list")
                .wrap(AuthMiddleware)
                .service(lists::get_lists)
                .service(lists::create_list)
                .service(lists::update_list)
                .service(lists::get_list_tasks),
        )
        .service(
            web::scope("/task")
                .wrap(AuthMiddleware)
                .service(tasks::create_task)
                .service(tasks::update_task),
        );
}
