// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! User Service
//!
//! Registration gated by institutional email certification, the certification
//! code round-trip, and account withdrawal.
//!
//! # Registration Flow
//!
//! 1. Normalize the email (trimmed, lowercase)
//! 2. Refuse a registered email before any certification call
//! 3. Ask the certifier whether the address completed code certification
//! 4. Hash the password and insert an `Active` user with role `User`
//! 5. Publish `UserRegistered`

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::error::{DuplicateKind, ServiceError};
use crate::domain::certification::{CertificationPayload, EmailCertifier};
use crate::domain::credentials::{PasswordHasher, TokenRevoker};
use crate::domain::events::UserEvent;
use crate::domain::policy::Clock;
use crate::domain::repository::{RepositoryError, UserRepository};
use crate::domain::user::{NewUser, Role, UserId, UserStatus};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSendRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailCertifyRequest {
    pub email: String,
    pub code: u32,
}

/// Characters that would break out of a header or cookie value.
const FORBIDDEN_EMAIL_CHARS: &[char] = &[';', ',', '=', '"', '\\'];

/// Trimmed, lowercased address; `None` when it cannot be an email.
///
/// The result is safe to place in a cookie value.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    if email
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_EMAIL_CHARS.contains(&c))
    {
        return None;
    }
    Some(email)
}

fn require_email(raw: &str) -> Result<String, ServiceError> {
    normalize_email(raw).ok_or_else(|| ServiceError::Validation(format!("'{}' is not an email address", raw.trim())))
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn register_user(&self, request: SignupRequest) -> Result<SignupResponse, ServiceError>;

    /// Ask the certifier to mail a code. The certifier's reply is returned as-is.
    async fn send_email_code(&self, email: &str) -> Result<CertificationPayload, ServiceError>;

    /// Confirm a mailed code. The certifier's reply is returned as-is.
    async fn certify_email_code(&self, email: &str, code: u32) -> Result<CertificationPayload, ServiceError>;

    /// Revoke the caller's access token, then delete the account.
    async fn withdraw_user(&self, username: &str, token: &str) -> Result<(), ServiceError>;
}

pub struct StandardUserService {
    users: Arc<dyn UserRepository>,
    certifier: Arc<dyn EmailCertifier>,
    hasher: Arc<dyn PasswordHasher>,
    revoker: Arc<dyn TokenRevoker>,
    clock: Arc<dyn Clock>,
    event_bus: Arc<EventBus>,
}

impl StandardUserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        certifier: Arc<dyn EmailCertifier>,
        hasher: Arc<dyn PasswordHasher>,
        revoker: Arc<dyn TokenRevoker>,
        clock: Arc<dyn Clock>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            users,
            certifier,
            hasher,
            revoker,
            clock,
            event_bus,
        }
    }
}

#[async_trait]
impl UserService for StandardUserService {
    async fn register_user(&self, request: SignupRequest) -> Result<SignupResponse, ServiceError> {
        let email = require_email(&request.email)?;
        if request.password.is_empty() {
            return Err(ServiceError::Validation("password must not be empty".to_string()));
        }

        if self.users.exists_by_email(&email).await? {
            debug!(email = %email, "Registration refused: email taken");
            return Err(ServiceError::Duplicate(DuplicateKind::EmailAlreadyRegistered));
        }

        let status = self.certifier.status(&email).await?;
        if !status.success {
            info!(email = %email, "Registration refused: email not certified");
            return Err(ServiceError::EmailNotCertified);
        }

        let new_user = NewUser {
            email: email.clone(),
            password_hash: self.hasher.hash(&request.password)?,
            status: UserStatus::Active,
            role: Role::User,
            created_at: self.clock.now(),
        };

        let user = self.users.insert(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => ServiceError::Duplicate(DuplicateKind::EmailAlreadyRegistered),
            other => ServiceError::Repository(other),
        })?;

        info!(user_id = %user.id, email = %user.email, "User registered");
        metrics::counter!("cheongwon_users_registered_total").increment(1);
        self.event_bus.publish_user_event(UserEvent::UserRegistered {
            user_id: user.id,
            email: user.email.clone(),
            registered_at: user.created_at,
        });

        Ok(SignupResponse {
            user_id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    async fn send_email_code(&self, email: &str) -> Result<CertificationPayload, ServiceError> {
        let email = require_email(email)?;
        let payload = self.certifier.certify(&email).await?;
        debug!(email = %email, "Certification code requested");
        Ok(payload)
    }

    async fn certify_email_code(&self, email: &str, code: u32) -> Result<CertificationPayload, ServiceError> {
        let email = require_email(email)?;
        let payload = self.certifier.certify_code(&email, code).await?;
        debug!(email = %email, "Certification code submitted");
        Ok(payload)
    }

    async fn withdraw_user(&self, username: &str, token: &str) -> Result<(), ServiceError> {
        self.revoker.destroy_token(username, token);

        let email = normalize_email(username).unwrap_or_else(|| username.to_string());
        if self.users.delete_by_email(&email).await? {
            info!(email = %email, "User withdrawn");
            self.event_bus.publish_user_event(UserEvent::UserWithdrawn {
                email,
                withdrawn_at: self.clock.now(),
            });
        } else {
            warn!(email = %email, "Withdrawal for unknown account; token revoked only");
        }
        Ok(())
    }
}
