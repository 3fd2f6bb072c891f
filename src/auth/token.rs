//! Signed session tokens.
//!
//! Access and refresh tokens are both HS256 JWTs carrying the same [`Claims`];
//! they differ only in the secret that signs them and in their lifetime. A
//! refresh token can therefore never pass as an access token and vice versa.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// Which of the two token families a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn lifetime(self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(15),
            TokenKind::Refresh => Duration::days(7),
        }
    }
}

/// Payload of every token this service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub surname: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Random per-token id; two tokens minted in the same second still differ.
    pub jti: String,
}

/// A freshly signed token and the instant its `exp` claim points at.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Malformed, forged and expired tokens all end up here.
#[derive(Debug, Error)]
#[error("invalid token: {0}")]
pub struct InvalidToken(#[from] jsonwebtoken::errors::Error);

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Mints and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn issue_access(&self, user: &User) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue_at(TokenKind::Access, user, Utc::now())
    }

    pub fn issue_refresh(&self, user: &User) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue_at(TokenKind::Refresh, user, Utc::now())
    }

    /// Signs a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        kind: TokenKind,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at + kind.lifetime();
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature and expiry against the secret of `kind`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, InvalidToken> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)?;
        Ok(data.claims)
    }
}
