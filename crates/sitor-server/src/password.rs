//! Argon2id hashing for account passwords and group join codes.
//!
//! Hashes are PHC strings, so parameters travel with the hash. Hashing is
//! CPU-bound; the async wrappers move it onto the blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::error::ServerError;

pub fn hash_secret(plain: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("argon2 hashing failed: {e}")))
}

/// `false` for a wrong secret and for an unparsable stored hash alike.
pub fn verify_secret(plain: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        tracing::warn!("Stored secret hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub async fn hash(plain: String) -> Result<String, ServerError> {
    tokio::task::spawn_blocking(move || hash_secret(&plain))
        .await
        .map_err(|e| ServerError::Internal(format!("hash task failed: {e}")))?
}

pub async fn verify(plain: String, stored: String) -> Result<bool, ServerError> {
    tokio::task::spawn_blocking(move || verify_secret(&plain, &stored))
        .await
        .map_err(|e| ServerError::Internal(format!("verify task failed: {e}")))
}
