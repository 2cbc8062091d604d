//! Password hashing and token generation
//!
//! Passwords are hashed with argon2; the hash is treated as an opaque
//! one-way value everywhere else. Bearer tokens are random opaque strings
//! generated once at registration.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::error::AppError;

const TOKEN_BYTES: usize = 32;

lazy_static::lazy_static! {
    /// Hash verified against when a login email is unknown, so that the
    /// unknown-email and wrong-password paths do the same work.
    static ref DUMMY_HASH: String =
        hash_password("correct-horse-battery-staple").expect("hashing a fixed password succeeds");
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Burn one verification against a dummy hash
///
/// Called on the unknown-email login path to keep its shape identical to
/// the wrong-password path.
pub fn verify_dummy_password(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}

/// Generate an opaque bearer token (32 random bytes, url-safe base64)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
