use std::sync::Arc;

use bcrypt::BcryptError;

/// Plaintext the decoy digest is built from. Never a real account password.
const DECOY_PLAINTEXT: &str = "listforge-decoy-credential";

/// Salted one-way password hashing with a fixed bcrypt cost.
///
/// Cloning is cheap; the decoy digest is shared.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    decoy_hash: Arc<str>,
}

impl PasswordHasher {
    /// Builds a hasher and precomputes the decoy digest at the same cost.
    pub fn new(cost: u32) -> Result<Self, BcryptError> {
        let decoy_hash = bcrypt::hash(DECOY_PLAINTEXT, cost)?;
        Ok(Self {
            cost,
            decoy_hash: decoy_hash.into(),
        })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, BcryptError> {
        bcrypt::hash(plaintext, self.cost)
    }

    /// `Ok(false)` on mismatch; `Err` only when `digest` is not a bcrypt digest.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(plaintext, digest)
    }

    /// Spends one verification against the decoy digest.
    ///
    /// Called when the email is unknown so the response takes as long as a
    /// wrong-password rejection.
    pub fn verify_decoy(&self, plaintext: &str) {
        if let Err(e) = bcrypt::verify(plaintext, &self.decoy_hash) {
            log::error!("decoy verification failed: {}", e);
        }
    }
}
