// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the platform's aggregates. Interfaces live in the
//! domain layer and are implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `UserRepository` | `User` | `InMemoryUserRepository`, `PostgresUserRepository` |
//! | `PetitionRepository` | `Petition` + `Link` | `InMemoryPetitionRepository`, `PostgresPetitionRepository` |
//! | `AgreementRepository` | `Agreement` | `InMemoryAgreementRepository`, `PostgresAgreementRepository` |
//! | `ReportRepository` | `Report` | `InMemoryReportRepository`, `PostgresReportRepository` |
//!
//! ## Units of Work
//!
//! Every mutating method is one atomic unit: either all of its effects are
//! visible or none are. Counters are incremented by the store itself, never
//! read into application memory and written back. Pair uniqueness for
//! agreements and reports is a store-level constraint; a violation surfaces as
//! `RepositoryError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::engagement::{Agreement, Report};
use crate::domain::petition::{NewPetition, Petition, PetitionId, PetitionStatus};
use crate::domain::user::{NewUser, User, UserId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A taken email yields `Conflict`.
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Delete by email, cascading to the user's petitions and records.
    /// Returns whether a row was removed.
    async fn delete_by_email(&self, email: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait PetitionRepository: Send + Sync {
    /// Insert a petition with its links.
    ///
    /// The owner is locked for the duration of the insert and the insert is
    /// refused with `Conflict` if the owner already has a petition created
    /// after `cooldown_cutoff`. A missing owner yields `NotFound`.
    async fn insert(
        &self,
        petition: &NewPetition,
        cooldown_cutoff: DateTime<Utc>,
    ) -> Result<Petition, RepositoryError>;

    async fn find_by_id(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError>;

    /// Atomically add one to the view counter and return the updated petition.
    async fn increment_view_count(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError>;

    /// Most recently created petition of `user_id`, if any.
    async fn find_latest_by_user(&self, user_id: UserId) -> Result<Option<Petition>, RepositoryError>;

    /// Newest first.
    async fn list(
        &self,
        status: Option<PetitionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Petition>, RepositoryError>;

    async fn update_status(
        &self,
        id: PetitionId,
        status: PetitionStatus,
    ) -> Result<Option<Petition>, RepositoryError>;

    /// Delete the petition and return the state it had just before deletion.
    async fn delete(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError>;
}

#[async_trait]
pub trait AgreementRepository: Send + Sync {
    /// Insert the agreement and add one to the petition's agreement counter.
    ///
    /// - duplicate (user, petition) pair: `Conflict`
    /// - petition no longer ongoing: `StaleState`
    /// - petition or user missing: `NotFound`
    async fn create(
        &self,
        user_id: UserId,
        petition_id: PetitionId,
        created_at: DateTime<Utc>,
    ) -> Result<Agreement, RepositoryError>;

    async fn exists(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, RepositoryError>;

    async fn count_by_petition(&self, petition_id: PetitionId) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Insert the report. Duplicate pairs yield `Conflict`.
    async fn create(
        &self,
        user_id: UserId,
        petition_id: PetitionId,
        created_at: DateTime<Utc>,
    ) -> Result<Report, RepositoryError>;

    async fn exists(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Constraint conflict: {0}")]
    Conflict(String),

    #[error("Precondition no longer holds: {0}")]
    StaleState(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(ref db) => match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => RepositoryError::Conflict(db.message().to_string()),
                Some(FOREIGN_KEY_VIOLATION) => RepositoryError::NotFound(db.message().to_string()),
                _ => RepositoryError::Database(err.to_string()),
            },
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}
