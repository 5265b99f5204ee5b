// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Report Repository
//!
//! Reports carry no counter, so a single statement is the whole unit of work.
//! Duplicate pairs are rejected by `uq_reports_user_petition`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::engagement::{Report, ReportId};
use crate::domain::petition::PetitionId;
use crate::domain::repository::{ReportRepository, RepositoryError};
use crate::domain::user::UserId;

pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn create(
        &self,
        user_id: UserId,
        petition_id: PetitionId,
        created_at: DateTime<Utc>,
    ) -> Result<Report, RepositoryError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO reports (user_id, petition_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT uq_reports_user_petition DO NOTHING
            RETURNING id, created_at
            "#,
        )
        .bind(user_id.0)
        .bind(petition_id.0)
        .bind(created_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(Report {
                id: ReportId(row.get("id")),
                user_id,
                petition_id,
                created_at: row.get("created_at"),
            }),
            None => Err(RepositoryError::Conflict(format!(
                "user {} already reported petition {}",
                user_id, petition_id
            ))),
        }
    }

    async fn exists(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reports WHERE user_id = $1 AND petition_id = $2)",
        )
        .bind(user_id.0)
        .bind(petition_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(exists)
    }
}
