//! Argon2 password hashing for stored user credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

/// Hash checked when the account does not exist, so unknown and known
/// usernames cost the same argon2 work.
fn absent_account_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("absent-account").unwrap_or_default())
}

/// Hashes `plain` into a PHC string with a fresh random salt.
///
/// CPU-bound; call from `spawn_blocking` inside request handlers.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Checks `plain` against a stored PHC hash. Malformed hashes never verify.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Like [`verify_password`], but runs a full verification against a fixed
/// hash when `stored` is `None`. Always `false` in that case.
pub fn verify_account_password(plain: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(hash) => verify_password(plain, hash),
        None => {
            let decoy = absent_account_hash();
            if !decoy.is_empty() {
                let _ = verify_password(plain, decoy);
            }
            false
        }
    }
}
