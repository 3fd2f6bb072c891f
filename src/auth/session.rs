//! Session use-case.
//!
//! Signup, login, refresh, current-user resolution and logout all go through
//! [`SessionService`]. Refresh and current-user share one verification path:
//!
//! 1. the stored record is looked up by the raw token string (active records only);
//! 2. the token is verified against the refresh secret, the stored expiry and the
//!    stored owner;
//! 3. on failure the record is deactivated before the error is returned;
//! 4. on success the user is re-resolved from the verified claims.

use std::sync::Arc;

use bcrypt::BcryptError;
use chrono::Utc;
use thiserror::Error;

use super::password::PasswordHasher;
use super::token::{TokenIssuer, TokenKind};
use crate::models::{NewUser, User};
use crate::store::{RefreshTokenStore, StoreError, UserStore};

/// Why a login was refused. Only ever logged; clients see one message for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownEmail,
    PasswordMismatch,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials(CredentialFailure),
    #[error("no refresh token provided")]
    NoToken,
    #[error("refresh token is not on record")]
    InvalidToken,
    #[error("refresh token failed verification")]
    ExpiredOrInvalid,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hashing(#[from] BcryptError),
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("{0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for SessionError {
    fn from(error: tokio::task::JoinError) -> Self {
        SessionError::Internal(format!("password task failed: {}", error))
    }
}

/// Input to [`SessionService::signup`]; already shape-validated.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

/// Input to [`SessionService::login`]; already shape-validated.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        tokens: Arc<TokenIssuer>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            tokens,
            hasher,
        }
    }

    /// Creates the user. Does not log them in.
    pub async fn signup(&self, registration: Registration) -> Result<User, SessionError> {
        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(SessionError::DuplicateEmail);
        }

        let hasher = self.hasher.clone();
        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let user = self
            .users
            .create_user(NewUser {
                email: registration.email,
                password_hash,
                name: registration.name,
                surname: registration.surname,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent signup for the same email.
                StoreError::Conflict(_) => SessionError::DuplicateEmail,
                other => SessionError::Store(other),
            })?;

        log::info!("user {} signed up", user.id);
        Ok(user)
    }

    /// Checks credentials, then opens a new session.
    ///
    /// Every login opens its own session; earlier sessions of the same user stay valid.
    pub async fn login(&self, credentials: Credentials) -> Result<LoginOutcome, SessionError> {
        let found = self.users.find_active_by_email(&credentials.email).await?;

        let hasher = self.hasher.clone();
        let password = credentials.password;
        let user = match found {
            Some(user) => {
                let digest = user.password_hash.clone();
                let matches =
                    tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
                        .await??;
                if !matches {
                    return Err(Self::reject_login(CredentialFailure::PasswordMismatch));
                }
                user
            }
            None => {
                tokio::task::spawn_blocking(move || hasher.verify_decoy(&password)).await?;
                return Err(Self::reject_login(CredentialFailure::UnknownEmail));
            }
        };

        let access = self.tokens.issue_access(&user)?;
        let refresh = self.tokens.issue_refresh(&user)?;
        self.refresh_tokens
            .save(&refresh.token, &user, refresh.expires_at)
            .await?;

        log::info!("user {} logged in", user.id);
        Ok(LoginOutcome {
            access_token: access.token,
            refresh_token: refresh.token,
            user,
        })
    }

    fn reject_login(cause: CredentialFailure) -> SessionError {
        log::info!("login rejected: {:?}", cause);
        SessionError::InvalidCredentials(cause)
    }

    /// Mints a new access token for the session behind `refresh_token`.
    /// The refresh token itself is left unchanged.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, SessionError> {
        let token = refresh_token.ok_or(SessionError::NoToken)?;
        let user = self.verify_session(token).await?;
        Ok(self.tokens.issue_access(&user)?.token)
    }

    /// Resolves the user behind `refresh_token`.
    pub async fn current_user(&self, refresh_token: Option<&str>) -> Result<User, SessionError> {
        let token = refresh_token.ok_or(SessionError::NoToken)?;
        self.verify_session(token).await
    }

    /// Ends the session. Returns whether a stored record was removed; an
    /// unknown token is not an error.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<bool, SessionError> {
        let token = refresh_token.ok_or(SessionError::NoToken)?;
        let removed = self.refresh_tokens.delete(token).await?;
        if removed > 0 {
            log::info!("session closed");
        }
        Ok(removed > 0)
    }

    async fn verify_session(&self, token: &str) -> Result<User, SessionError> {
        let stored = self
            .refresh_tokens
            .find_by_token(token)
            .await?
            .ok_or(SessionError::InvalidToken)?;

        let verified = self
            .tokens
            .verify(token, TokenKind::Refresh)
            .map_err(|e| e.to_string())
            .and_then(|claims| {
                if claims.user_id != stored.record.user_id || claims.user_id != stored.owner.id {
                    Err("claims do not match the stored owner".to_string())
                } else if stored.record.is_expired_at(Utc::now()) {
                    Err("stored expiry has passed".to_string())
                } else {
                    Ok(claims)
                }
            });

        let claims = match verified {
            Ok(claims) => claims,
            Err(reason) => {
                log::warn!(
                    "refresh token {} of user {} rejected: {}",
                    stored.record.id,
                    stored.record.user_id,
                    reason
                );
                if self.refresh_tokens.deactivate(&stored.record).await? {
                    log::info!("refresh token {} deactivated", stored.record.id);
                }
                return Err(SessionError::ExpiredOrInvalid);
            }
        };

        self.users
            .find_active_by_id(claims.user_id)
            .await?
            .ok_or(SessionError::UserNotFound)
    }
}
