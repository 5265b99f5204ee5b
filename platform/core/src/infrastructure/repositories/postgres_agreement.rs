// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Agreement Repository
//!
//! The agreement row and the petition's `agree_count` change together in one
//! transaction. The insert relies on `uq_agreements_user_petition`; the
//! increment is an in-place `agree_count + 1` that only applies while the
//! petition is still ongoing, so a concurrent close rolls the insert back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::engagement::{Agreement, AgreementId};
use crate::domain::petition::{PetitionId, PetitionStatus};
use crate::domain::repository::{AgreementRepository, RepositoryError};
use crate::domain::user::UserId;

pub struct PostgresAgreementRepository {
    pool: PgPool,
}

impl PostgresAgreementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgreementRepository for PostgresAgreementRepository {
    async fn create(
        &self,
        user_id: UserId,
        petition_id: PetitionId,
        created_at: DateTime<Utc>,
    ) -> Result<Agreement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO agreements (user_id, petition_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT uq_agreements_user_petition DO NOTHING
            RETURNING id, created_at
            "#,
        )
        .bind(user_id.0)
        .bind(petition_id.0)
        .bind(created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = inserted else {
            return Err(RepositoryError::Conflict(format!(
                "user {} already agreed to petition {}",
                user_id, petition_id
            )));
        };

        let updated = sqlx::query(
            r#"
            UPDATE petitions
            SET agree_count = agree_count + 1
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(petition_id.0)
        .bind(PetitionStatus::Ongoing.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to increment agree_count: {}", e)))?;

        if updated.rows_affected() == 0 {
            // Dropping `tx` rolls the agreement insert back.
            return Err(RepositoryError::StaleState(format!(
                "petition {} is no longer ongoing",
                petition_id
            )));
        }

        tx.commit().await?;

        Ok(Agreement {
            id: AgreementId(row.get("id")),
            user_id,
            petition_id,
            created_at: row.get("created_at"),
        })
    }

    async fn exists(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM agreements WHERE user_id = $1 AND petition_id = $2)",
        )
        .bind(user_id.0)
        .bind(petition_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(exists)
    }

    async fn count_by_petition(&self, petition_id: PetitionId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agreements WHERE petition_id = $1")
            .bind(petition_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(count)
    }
}
