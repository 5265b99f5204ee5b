// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Argon2id password hashing. Stored hashes are PHC strings carrying their own
//! salt and parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString},
    Argon2,
};

use crate::domain::credentials::{CredentialError, PasswordHasher};

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hash(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    fn verifies(password: &str, hash: &str) -> bool {
        let parsed = PasswordHash::new(hash).unwrap();
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }

    #[test]
    fn test_hash_verifies_with_argon2() {
        let hash = Argon2PasswordHasher.hash("hufs-1954!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verifies("hufs-1954!", &hash));
        assert!(!verifies("wrong", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = Argon2PasswordHasher;
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }
}
