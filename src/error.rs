//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by every HTTP-facing
//! part of the application. Lower layers have their own error types
//! (`StoreError` for persistence, `SessionError` for the session use-case) which
//! are converted into `AppError` at the handler boundary with `?`.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers and
//! middleware can return it directly. Internal and database failures are logged
//! with their full detail and rendered to the client as a generic message.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::session::SessionError;
use crate::store::StoreError;

/// Body sent for every 500 response; the real cause only goes to the log.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can reach an HTTP response.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failure during a refresh-token check (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Missing/invalid access token, or an authenticated caller on a guest-only route (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Malformed request or rejected credentials (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The requested resource does not exist or is not owned by the caller (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Uniqueness violation (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Input failed field validation (HTTP 400). Every violated field is reported.
    #[error("Validation Error: {0}")]
    ValidationError(ValidationErrors),
    /// Unexpected server-side failure (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Failure reported by the database driver (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
}

impl AppError {
    pub fn not_authenticated() -> Self {
        AppError::Forbidden("Not authenticated".into())
    }
}

/// Request bodies are camelCase on the wire while the validated structs use
/// snake_case fields.
fn wire_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = !name.is_empty();
        } else if upper_next {
            name.extend(c.to_uppercase());
            upper_next = false;
        } else {
            name.push(c);
        }
    }
    name
}

/// Flattens validator output into `(field, message)` pairs keyed by the wire
/// field name, sorted by that name.
fn validation_details(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut details: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", wire_field_name(&field)));
                (wire_field_name(&field), message)
            })
        })
        .collect();
    details.sort();
    details
}

/// Converts `AppError` variants into JSON `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => builder.json(json!({ "error": msg })),
            AppError::ValidationError(errors) => {
                let details = validation_details(errors);
                let summary = details
                    .iter()
                    .map(|(_, message)| message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let details: Vec<_> = details
                    .iter()
                    .map(|(field, message)| json!({ "field": field, "message": message }))
                    .collect();
                builder.json(json!({ "error": summary, "details": details }))
            }
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                log::error!("{}", self);
                builder.json(json!({ "error": INTERNAL_ERROR_MESSAGE }))
            }
        }
    }
}

/// `RowNotFound` becomes `NotFound`; every other driver error is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict(what) => AppError::Conflict(what),
            StoreError::Database(e) => AppError::from(e),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> AppError {
        match error {
            SessionError::DuplicateEmail => AppError::Conflict("Email is already in use!".into()),
            SessionError::InvalidCredentials(_) => {
                AppError::BadRequest("Invalid Credentials".into())
            }
            SessionError::NoToken => AppError::Unauthorized("No refresh token provided".into()),
            SessionError::InvalidToken => AppError::Unauthorized("Invalid refresh token".into()),
            SessionError::ExpiredOrInvalid => {
                AppError::Unauthorized("Invalid or expired refresh token".into())
            }
            SessionError::UserNotFound => AppError::NotFound("User not found".into()),
            SessionError::Store(e) => AppError::from(e),
            SessionError::Hashing(e) => AppError::from(e),
            SessionError::Signing(e) => {
                AppError::InternalServerError(format!("Failed to sign token: {}", e))
            }
            SessionError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}
