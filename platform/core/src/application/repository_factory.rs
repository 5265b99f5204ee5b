// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration. The in-memory repositories must share one `InMemoryStore`,
//! so they are always built together as a `Repositories` set.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire repository trait objects for the services

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::domain::repository::{
    AgreementRepository, PetitionRepository, ReportRepository, StorageBackend, UserRepository,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_agreement::PostgresAgreementRepository;
use crate::infrastructure::repositories::postgres_petition::PostgresPetitionRepository;
use crate::infrastructure::repositories::postgres_report::PostgresReportRepository;
use crate::infrastructure::repositories::postgres_user::PostgresUserRepository;
use crate::infrastructure::repositories::InMemoryStore;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub petitions: Arc<dyn PetitionRepository>,
    pub agreements: Arc<dyn AgreementRepository>,
    pub reports: Arc<dyn ReportRepository>,
}

/// Repositories over a fresh in-memory store
pub fn create_in_memory_repositories() -> Repositories {
    let store = InMemoryStore::new();
    Repositories {
        users: Arc::new(store.users()),
        petitions: Arc::new(store.petitions()),
        agreements: Arc::new(store.agreements()),
        reports: Arc::new(store.reports()),
    }
}

/// Repositories over a PostgreSQL pool
pub fn create_postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        petitions: Arc::new(PostgresPetitionRepository::new(pool.clone())),
        agreements: Arc::new(PostgresAgreementRepository::new(pool.clone())),
        reports: Arc::new(PostgresReportRepository::new(pool)),
    }
}

/// Connect (and migrate, for PostgreSQL) according to `backend`.
///
/// The returned `Database` is `None` for the in-memory backend.
pub async fn create_repositories(backend: &StorageBackend) -> Result<(Repositories, Option<Database>)> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory storage; data is lost on restart");
            Ok((create_in_memory_repositories(), None))
        }
        StorageBackend::PostgreSQL(config) => {
            let database = Database::new(config).await?;
            database.migrate().await?;
            info!(max_connections = config.max_connections, "Using PostgreSQL storage");
            Ok((create_postgres_repositories(database.get_pool().clone()), Some(database)))
        }
    }
}
