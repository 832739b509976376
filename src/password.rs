//! Password hashing and verification (Argon2id).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Errors from password hashing.
#[derive(Debug)]
pub enum PasswordError {
    /// The hash could not be produced or the stored digest is malformed.
    Hash(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Hash(msg) => write!(f, "Password hash error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored digest.
///
/// A mismatch is an ordinary `false`, not an error; only a malformed stored
/// digest fails. Parameters are taken from the digest itself.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(|e| PasswordError::Hash(e.to_string()))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
