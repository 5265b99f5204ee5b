// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! # Institutional Email Certification Port
//!
//! Proof that an address belongs to a member of the institution comes from a
//! third-party service. The domain only sees this trait; the HTTP adapter lives
//! in `crate::infrastructure::univcert_client`.
//!
//! The API key and institution name are adapter configuration, so callers pass
//! only the email (and the code, when confirming).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw JSON object returned by the certification service.
pub type CertificationPayload = Map<String, Value>;

/// Outcome of a status lookup for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationStatus {
    pub success: bool,
    #[serde(flatten)]
    pub metadata: CertificationPayload,
}

impl CertificationStatus {
    pub fn certified() -> Self {
        Self { success: true, metadata: Map::new() }
    }

    pub fn uncertified() -> Self {
        Self { success: false, metadata: Map::new() }
    }
}

#[derive(Debug, Error)]
pub enum CertificationError {
    #[error("certification service unreachable: {0}")]
    Transport(String),

    #[error("certification service returned an unreadable response: {0}")]
    Decode(String),

    #[error("certification client misconfigured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait EmailCertifier: Send + Sync {
    /// Whether `email` has completed code certification.
    async fn status(&self, email: &str) -> Result<CertificationStatus, CertificationError>;

    /// Ask the service to mail a certification code to `email`.
    async fn certify(&self, email: &str) -> Result<CertificationPayload, CertificationError>;

    /// Confirm the code the user received.
    async fn certify_code(&self, email: &str, code: u32) -> Result<CertificationPayload, CertificationError>;
}
