// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Ports for credential handling: token revocation and password hashing.
//!
//! Token issuance happens in the authentication gateway. This service only
//! needs to revoke what the gateway issued and to hash passwords it stores;
//! password verification happens at the gateway as well.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Token-lifecycle collaborator.
pub trait TokenRevoker: Send + Sync {
    /// Blacklist an access token issued to `username`.
    fn destroy_token(&self, username: &str, token: &str);

    /// Whether an access token was revoked and has not yet aged out of the blacklist.
    fn is_revoked(&self, token: &str) -> bool;
}

pub trait PasswordHasher: Send + Sync {
    /// Salted one-way hash in PHC string form.
    fn hash(&self, password: &str) -> Result<String, CredentialError>;
}
