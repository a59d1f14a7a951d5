// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Argon2id password hashing.
//!
//! Hashes are PHC strings carrying their own salt and parameters, so
//! verification needs nothing but the stored string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::AuthError;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AuthError::InternalError(e.to_string())
        })
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::error!(error = %e, "Stored password hash is unreadable");
        AuthError::InternalError(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(
            hash_password("password123").unwrap(),
            hash_password("password123").unwrap()
        );
    }

    #[test]
    fn garbage_hash_is_internal_error() {
        assert!(matches!(
            verify_password("password123", "not-a-phc-string"),
            Err(AuthError::InternalError(_))
        ));
    }
}
