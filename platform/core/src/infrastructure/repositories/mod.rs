// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve users, petitions and their records
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresUserRepository** - accounts, cascade on withdrawal
//! - **PostgresPetitionRepository** - petitions and links, cooldown-guarded inserts
//! - **PostgresAgreementRepository** - agreement insert + counter increment in one transaction
//! - **PostgresReportRepository** - report insert guarded by the pair constraint
//!
//! ## In-Memory Repositories
//!
//! All four in-memory repositories are views over one `InMemoryStore`. The
//! store keeps every table behind a single mutex, so each repository call is
//! one atomic step over all tables, mirroring a transaction.
//!
//! ```no_run
//! use cheongwon_core::infrastructure::repositories::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! let users = store.users();
//! let petitions = store.petitions();
//! ```

pub mod postgres_user;
pub mod postgres_petition;
pub mod postgres_agreement;
pub mod postgres_report;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::engagement::{Agreement, AgreementId, Report, ReportId};
use crate::domain::petition::{Link, LinkId, NewPetition, Petition, PetitionId, PetitionStatus};
use crate::domain::repository::{
    AgreementRepository, PetitionRepository, ReportRepository, RepositoryError, UserRepository,
};
use crate::domain::user::{NewUser, User, UserId};

#[derive(Default)]
struct Tables {
    last_user_id: i64,
    last_petition_id: i64,
    last_link_id: i64,
    last_agreement_id: i64,
    last_report_id: i64,
    users: BTreeMap<UserId, User>,
    petitions: BTreeMap<PetitionId, Petition>,
    agreements: HashMap<(UserId, PetitionId), Agreement>,
    reports: HashMap<(UserId, PetitionId), Report>,
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

/// Shared backing tables for the in-memory repositories.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository { tables: self.tables.clone() }
    }

    pub fn petitions(&self) -> InMemoryPetitionRepository {
        InMemoryPetitionRepository { tables: self.tables.clone() }
    }

    pub fn agreements(&self) -> InMemoryAgreementRepository {
        InMemoryAgreementRepository { tables: self.tables.clone() }
    }

    pub fn reports(&self) -> InMemoryReportRepository {
        InMemoryReportRepository { tables: self.tables.clone() }
    }
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!("email '{}' already registered", user.email)));
        }
        let id = UserId(next_id(&mut tables.last_user_id));
        let stored = User {
            id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            status: user.status,
            role: user.role,
            created_at: user.created_at,
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.lock().users.values().any(|u| u.email == email))
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        let Some(user_id) = tables.users.values().find(|u| u.email == email).map(|u| u.id) else {
            return Ok(false);
        };

        // Keep agree_count in step with the agreements that disappear with the user.
        let agreed: Vec<PetitionId> = tables
            .agreements
            .keys()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, pid)| *pid)
            .collect();
        for petition_id in agreed {
            if let Some(petition) = tables.petitions.get_mut(&petition_id) {
                petition.agree_count -= 1;
            }
        }

        let owned: Vec<PetitionId> = tables
            .petitions
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect();
        for petition_id in &owned {
            tables.petitions.remove(petition_id);
        }

        tables
            .agreements
            .retain(|(uid, pid), _| *uid != user_id && !owned.contains(pid));
        tables
            .reports
            .retain(|(uid, pid), _| *uid != user_id && !owned.contains(pid));
        tables.users.remove(&user_id);
        Ok(true)
    }
}

#[derive(Clone)]
pub struct InMemoryPetitionRepository {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl PetitionRepository for InMemoryPetitionRepository {
    async fn insert(
        &self,
        petition: &NewPetition,
        cooldown_cutoff: DateTime<Utc>,
    ) -> Result<Petition, RepositoryError> {
        let mut tables = self.tables.lock();
        if !tables.users.contains_key(&petition.user_id) {
            return Err(RepositoryError::NotFound(format!("user {}", petition.user_id)));
        }
        let within_cooldown = tables
            .petitions
            .values()
            .any(|p| p.user_id == petition.user_id && p.created_at > cooldown_cutoff);
        if within_cooldown {
            return Err(RepositoryError::Conflict(format!(
                "user {} submitted a petition after {}",
                petition.user_id, cooldown_cutoff
            )));
        }

        let id = PetitionId(next_id(&mut tables.last_petition_id));
        let mut links = Vec::with_capacity(petition.links.len());
        for url in &petition.links {
            links.push(Link {
                id: LinkId(next_id(&mut tables.last_link_id)),
                petition_id: id,
                url: url.clone(),
            });
        }

        let stored = Petition {
            id,
            user_id: petition.user_id,
            title: petition.title.clone(),
            category: petition.category.clone(),
            content: petition.content.clone(),
            status: PetitionStatus::Ongoing,
            view_count: 0,
            agree_count: 0,
            created_at: petition.created_at,
            links,
        };
        tables.petitions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError> {
        Ok(self.tables.lock().petitions.get(&id).cloned())
    }

    async fn increment_view_count(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.petitions.get_mut(&id).map(|p| {
            p.view_count += 1;
            p.clone()
        }))
    }

    async fn find_latest_by_user(&self, user_id: UserId) -> Result<Option<Petition>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .petitions
            .values()
            .filter(|p| p.user_id == user_id)
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn list(
        &self,
        status: Option<PetitionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Petition>, RepositoryError> {
        let tables = self.tables.lock();
        let mut petitions: Vec<Petition> = tables
            .petitions
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        petitions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(petitions
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update_status(
        &self,
        id: PetitionId,
        status: PetitionStatus,
    ) -> Result<Option<Petition>, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.petitions.get_mut(&id).map(|p| {
            p.status = status;
            p.clone()
        }))
    }

    async fn delete(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError> {
        let mut tables = self.tables.lock();
        let removed = tables.petitions.remove(&id);
        if removed.is_some() {
            tables.agreements.retain(|(_, pid), _| *pid != id);
            tables.reports.retain(|(_, pid), _| *pid != id);
        }
        Ok(removed)
    }
}

#[derive(Clone)]
pub struct InMemoryAgreementRepository {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl AgreementRepository for InMemoryAgreementRepository {
    async fn create(
        &self,
        user_id: UserId,
        petition_id: PetitionId,
        created_at: DateTime<Utc>,
    ) -> Result<Agreement, RepositoryError> {
        let mut tables = self.tables.lock();
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound(format!("user {}", user_id)));
        }
        match tables.petitions.get(&petition_id) {
            None => return Err(RepositoryError::NotFound(format!("petition {}", petition_id))),
            Some(p) if !p.is_ongoing() => {
                return Err(RepositoryError::StaleState(format!(
                    "petition {} is {}",
                    petition_id, p.status
                )))
            }
            Some(_) => {}
        }
        if tables.agreements.contains_key(&(user_id, petition_id)) {
            return Err(RepositoryError::Conflict(format!(
                "user {} already agreed to petition {}",
                user_id, petition_id
            )));
        }

        let agreement = Agreement {
            id: AgreementId(next_id(&mut tables.last_agreement_id)),
            user_id,
            petition_id,
            created_at,
        };
        tables.agreements.insert((user_id, petition_id), agreement.clone());
        if let Some(petition) = tables.petitions.get_mut(&petition_id) {
            petition.agree_count += 1;
        }
        Ok(agreement)
    }

    async fn exists(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, RepositoryError> {
        Ok(self.tables.lock().agreements.contains_key(&(user_id, petition_id)))
    }

    async fn count_by_petition(&self, petition_id: PetitionId) -> Result<i64, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.agreements.keys().filter(|(_, pid)| *pid == petition_id).count() as i64)
    }
}

#[derive(Clone)]
pub struct InMemoryReportRepository {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn create(
        &self,
        user_id: UserId,
        petition_id: PetitionId,
        created_at: DateTime<Utc>,
    ) -> Result<Report, RepositoryError> {
        let mut tables = self.tables.lock();
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound(format!("user {}", user_id)));
        }
        if !tables.petitions.contains_key(&petition_id) {
            return Err(RepositoryError::NotFound(format!("petition {}", petition_id)));
        }
        if tables.reports.contains_key(&(user_id, petition_id)) {
            return Err(RepositoryError::Conflict(format!(
                "user {} already reported petition {}",
                user_id, petition_id
            )));
        }

        let report = Report {
            id: ReportId(next_id(&mut tables.last_report_id)),
            user_id,
            petition_id,
            created_at,
        };
        tables.reports.insert((user_id, petition_id), report.clone());
        Ok(report)
    }

    async fn exists(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, RepositoryError> {
        Ok(self.tables.lock().reports.contains_key(&(user_id, petition_id)))
    }
}
