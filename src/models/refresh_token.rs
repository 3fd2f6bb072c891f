use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::User;

/// Lifecycle state of a persisted refresh token.
/// Corresponds to the `refresh_token_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "refresh_token_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenStatus {
    /// The token can still be exchanged for access tokens.
    Active,
    /// The token was found expired or invalid during a refresh. The row is kept
    /// for auditing but never matches a lookup again.
    Deactivated,
}

/// One login session, identified by the refresh token handed to the client.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub id: i32,
    pub token: String,
    pub user_id: i32,
    pub status: RefreshTokenStatus,
    pub created_at: DateTime<Utc>,
    /// Mirror of the `exp` claim signed into the token.
    pub expires_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_active(&self) -> bool {
        self.status == RefreshTokenStatus::Active
    }

    /// Still valid at exactly `expires_at`, matching how the signed `exp` is checked.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// An active refresh token together with the account that owns it.
#[derive(Debug, Clone)]
pub struct StoredRefreshToken {
    pub record: RefreshTokenRecord,
    pub owner: User,
}
