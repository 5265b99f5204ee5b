// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for the service and API integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use cheongwon_core::application::petition_service::{CreatePetitionRequest, StandardPetitionService};
use cheongwon_core::application::repository_factory::{create_in_memory_repositories, Repositories};
use cheongwon_core::application::user_service::StandardUserService;
use cheongwon_core::domain::certification::{
    CertificationError, CertificationPayload, CertificationStatus, EmailCertifier,
};
use cheongwon_core::domain::policy::{Clock, SubmissionPolicy};
use cheongwon_core::domain::user::{NewUser, Role, User, UserStatus};
use cheongwon_core::infrastructure::{Argon2PasswordHasher, EventBus, InMemoryTokenBlacklist};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Certifier that knows a fixed set of certified addresses.
#[derive(Default)]
pub struct MockCertifier {
    certified: Mutex<HashSet<String>>,
    unreachable: AtomicBool,
    pub status_calls: AtomicUsize,
    pub codes_sent: Mutex<Vec<String>>,
}

impl MockCertifier {
    pub fn certify_address(&self, email: &str) {
        self.certified.lock().insert(email.to_string());
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), CertificationError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(CertificationError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl EmailCertifier for MockCertifier {
    async fn status(&self, email: &str) -> Result<CertificationStatus, CertificationError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.certified.lock().contains(email) {
            Ok(CertificationStatus::certified())
        } else {
            Ok(CertificationStatus::uncertified())
        }
    }

    async fn certify(&self, email: &str) -> Result<CertificationPayload, CertificationError> {
        self.check_reachable()?;
        self.codes_sent.lock().push(email.to_string());
        Ok(object(json!({"success": true})))
    }

    async fn certify_code(&self, email: &str, code: u32) -> Result<CertificationPayload, CertificationError> {
        self.check_reachable()?;
        if code == 1234 {
            self.certify_address(email);
            Ok(object(json!({
                "success": true,
                "univName": "한국외국어대학교",
                "certified_email": email,
                "certified_date": "2026-03-02T09:00:00"
            })))
        } else {
            Ok(object(json!({"success": false, "message": "일치하지 않는 인증코드입니다."})))
        }
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub repos: Repositories,
    pub clock: Arc<ManualClock>,
    pub event_bus: Arc<EventBus>,
    pub certifier: Arc<MockCertifier>,
    pub revoker: Arc<InMemoryTokenBlacklist>,
    pub petitions: Arc<StandardPetitionService>,
    pub users: Arc<StandardUserService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(SubmissionPolicy::default())
    }

    pub fn with_policy(policy: SubmissionPolicy) -> Self {
        let repos = create_in_memory_repositories();
        let clock = Arc::new(ManualClock::new(t0()));
        let event_bus = Arc::new(EventBus::new(256));
        let certifier = Arc::new(MockCertifier::default());
        let revoker = Arc::new(InMemoryTokenBlacklist::default());

        let petitions = Arc::new(StandardPetitionService::new(
            repos.users.clone(),
            repos.petitions.clone(),
            repos.agreements.clone(),
            repos.reports.clone(),
            clock.clone(),
            policy,
            event_bus.clone(),
        ));
        let users = Arc::new(StandardUserService::new(
            repos.users.clone(),
            certifier.clone(),
            Arc::new(Argon2PasswordHasher),
            revoker.clone(),
            clock.clone(),
            event_bus.clone(),
        ));

        Self {
            repos,
            clock,
            event_bus,
            certifier,
            revoker,
            petitions,
            users,
        }
    }

    /// Insert a user directly, bypassing certification.
    pub async fn seed_user(&self, email: &str) -> User {
        self.seed_user_with_role(email, Role::User).await
    }

    pub async fn seed_user_with_role(&self, email: &str, role: Role) -> User {
        self.repos
            .users
            .insert(&NewUser {
                email: email.to_string(),
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
                status: UserStatus::Active,
                role,
                created_at: self.clock.now(),
            })
            .await
            .unwrap()
    }
}

pub fn petition_request(title: &str) -> CreatePetitionRequest {
    CreatePetitionRequest {
        title: title.to_string(),
        category: "campus".to_string(),
        content: "Please extend library opening hours during the exam period.".to_string(),
        links: vec!["https://library.hufs.ac.kr/hours".to_string()],
    }
}
