// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! UnivCert Client
//!
//! HTTP adapter for [`EmailCertifier`] against the UnivCert REST API.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Institutional email ownership checks
//! - **Integration:** User Service → UnivCert (`/status`, `/certify`, `/certifycode`)
//!
//! UnivCert answers failures such as "no such address" with a non-2xx status
//! and a JSON body carrying `success: false`. Those bodies are returned as data;
//! only transport failures and unreadable bodies become errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::certification::{
    CertificationError, CertificationPayload, CertificationStatus, EmailCertifier,
};
use crate::domain::config::CertificationConfig;

#[derive(Serialize)]
struct StatusRequest<'a> {
    key: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct CertifyRequest<'a> {
    key: &'a str,
    email: &'a str,
    #[serde(rename = "univName")]
    univ_name: &'a str,
    univ_check: bool,
}

#[derive(Serialize)]
struct CertifyCodeRequest<'a> {
    key: &'a str,
    email: &'a str,
    #[serde(rename = "univName")]
    univ_name: &'a str,
    code: u32,
}

pub struct UnivCertClient {
    base_url: String,
    api_key: Option<String>,
    org_name: String,
    client: Client,
}

impl UnivCertClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        org_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CertificationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CertificationError::Misconfigured(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            org_name: org_name.into(),
            client,
        })
    }

    /// Build from the `certification` config section with an already resolved key.
    pub fn from_config(
        config: &CertificationConfig,
        api_key: Option<String>,
    ) -> Result<Self, CertificationError> {
        Self::new(
            config.base_url.clone(),
            api_key,
            config.org_name.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn key(&self) -> Result<&str, CertificationError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CertificationError::Misconfigured("UnivCert API key is not set".to_string()))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<CertificationPayload, CertificationError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Calling UnivCert");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CertificationError::Transport(e.to_string()))?;

        let status = response.status();
        let value: Value = response
            .json()
            .await
            .map_err(|e| CertificationError::Decode(format!("{} ({})", e, status)))?;

        if !status.is_success() {
            warn!(url = %url, status = %status, "UnivCert returned a non-success status");
        }

        match value {
            Value::Object(map) => Ok(map),
            other => Err(CertificationError::Decode(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl EmailCertifier for UnivCertClient {
    async fn status(&self, email: &str) -> Result<CertificationStatus, CertificationError> {
        let body = StatusRequest { key: self.key()?, email };
        let mut payload = self.post("status", &body).await?;

        let success = payload
            .remove("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(CertificationStatus { success, metadata: payload })
    }

    async fn certify(&self, email: &str) -> Result<CertificationPayload, CertificationError> {
        let body = CertifyRequest {
            key: self.key()?,
            email,
            univ_name: &self.org_name,
            univ_check: true,
        };
        self.post("certify", &body).await
    }

    async fn certify_code(&self, email: &str, code: u32) -> Result<CertificationPayload, CertificationError> {
        let body = CertifyCodeRequest {
            key: self.key()?,
            email,
            univ_name: &self.org_name,
            code,
        };
        self.post("certifycode", &body).await
    }
}
