pub mod cookie;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;

pub use extractors::AuthenticatedUser;
pub use middleware::{AuthMiddleware, GuestOnly};
pub use password::PasswordHasher;
pub use session::{Credentials, LoginOutcome, Registration, SessionError, SessionService};
pub use token::{Claims, TokenIssuer, TokenKind};

/// Payload for `POST /signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(required(message = "name is required"))]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,

    #[validate(required(message = "surname is required"))]
    #[validate(length(min = 1, message = "surname is required"))]
    pub surname: Option<String>,

    #[validate(required(message = "email is required"))]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(required(message = "password is required"))]
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Payload for `POST /login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "email is required"))]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(required(message = "password is required"))]
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl TryFrom<SignupRequest> for Registration {
    type Error = AppError;

    /// Expects a request that already passed `validate()`.
    fn try_from(request: SignupRequest) -> Result<Self, Self::Error> {
        match (request.name, request.surname, request.email, request.password) {
            (Some(name), Some(surname), Some(email), Some(password)) => Ok(Registration {
                name,
                surname,
                email,
                password,
            }),
            _ => Err(AppError::BadRequest(
                "name, surname, email and password are required".into(),
            )),
        }
    }
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = AppError;

    fn try_from(request: LoginRequest) -> Result<Self, Self::Error> {
        match (request.email, request.password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(AppError::BadRequest("email and password are required".into())),
        }
    }
}
