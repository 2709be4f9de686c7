//! Credential primitives: opaque one-way password hashing and refresh-token
//! material.
//!
//! The rest of the crate treats these as black boxes. Nothing outside this
//! module inspects a hash, and plaintext passwords only ever flow through
//! [`hash_password`] and [`verify_password`].

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric};
use thiserror::Error;

/// Length of generated refresh tokens.
const REFRESH_TOKEN_LEN: usize = 64;

/// A credential could not be hashed or a stored hash is malformed.
#[derive(Debug, Error)]
#[error("credential error: {0}")]
pub struct CredentialError(String);

/// Hash a plaintext password into a PHC-format string.
///
/// # Errors
///
/// Returns an error when hashing fails (effectively unreachable with valid
/// parameters, but never panics).
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError(format!("hashing failed: {e}")))
}

/// Verify a plaintext password against a stored PHC-format hash.
///
/// A mismatch is `Ok(false)`, not an error; only a malformed stored hash
/// errors.
///
/// # Errors
///
/// Returns an error when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| CredentialError(format!("invalid stored hash: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError(format!("verification failed: {e}"))),
    }
}

/// Generate fresh opaque refresh-token material.
#[must_use]
pub fn generate_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_refresh_token, hash_password, verify_password};
    use testresult::TestResult;

    #[test]
    fn hash_then_verify_round_trip() -> TestResult {
        let hash = hash_password("s3cret")?;

        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash)?);
        assert!(!verify_password("wrong", &hash)?);

        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> TestResult {
        assert_ne!(hash_password("same")?, hash_password("same")?);

        Ok(())
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_sized() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
