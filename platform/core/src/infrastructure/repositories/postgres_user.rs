// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL User Repository
//!
//! `UserRepository` backed by the `users` table. Withdrawal removes the row;
//! `ON DELETE CASCADE` takes the user's petitions, agreements and reports with
//! it, and the agreement counters of other users' petitions are decremented in
//! the same transaction.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::repository::{RepositoryError, UserRepository};
use crate::domain::user::{NewUser, Role, User, UserId, UserStatus};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &PgRow) -> Result<User, RepositoryError> {
    let status_str: String = row.get("status");
    let role_str: String = row.get("role");

    let status = UserStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Serialization(format!("Unknown user status '{}'", status_str)))?;
    let role = Role::parse(&role_str)
        .ok_or_else(|| RepositoryError::Serialization(format!("Unknown user role '{}'", role_str)))?;

    Ok(User {
        id: UserId(row.get("id")),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        status,
        role,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, status, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, status, role, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.status.as_str())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_user(&row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, status, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(exists)
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1 FOR UPDATE")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(user_id) = user_id else {
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE petitions
            SET agree_count = agree_count - 1
            WHERE id IN (SELECT petition_id FROM agreements WHERE user_id = $1)
              AND user_id <> $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to release agreements: {}", e)))?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete user: {}", e)))?;

        tx.commit().await?;
        Ok(true)
    }
}
