// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Petition Repository
//!
//! `PetitionRepository` backed by the `petitions` and `links` tables.
//!
//! Submission runs in one transaction that locks the owner's `users` row,
//! re-checks the cooldown and inserts the petition with its links, so two
//! concurrent submissions by the same user cannot both pass the check. View
//! counting is a single `UPDATE ... RETURNING`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{PgConnection, Row};

use crate::domain::petition::{Link, LinkId, NewPetition, Petition, PetitionId, PetitionStatus};
use crate::domain::repository::{PetitionRepository, RepositoryError};
use crate::domain::user::UserId;

const PETITION_COLUMNS: &str =
    "id, user_id, title, category, content, status, view_count, agree_count, created_at";

pub struct PostgresPetitionRepository {
    pool: PgPool,
}

impl PostgresPetitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_petition(row: &PgRow, links: Vec<Link>) -> Result<Petition, RepositoryError> {
    let status_str: String = row.get("status");
    let status = PetitionStatus::parse(&status_str).ok_or_else(|| {
        RepositoryError::Serialization(format!("Unknown petition status '{}'", status_str))
    })?;

    Ok(Petition {
        id: PetitionId(row.get("id")),
        user_id: UserId(row.get("user_id")),
        title: row.get("title"),
        category: row.get("category"),
        content: row.get("content"),
        status,
        view_count: row.get("view_count"),
        agree_count: row.get("agree_count"),
        created_at: row.get("created_at"),
        links,
    })
}

async fn load_links(
    conn: &mut PgConnection,
    petition_ids: &[i64],
) -> Result<HashMap<i64, Vec<Link>>, RepositoryError> {
    let mut by_petition: HashMap<i64, Vec<Link>> = HashMap::new();
    if petition_ids.is_empty() {
        return Ok(by_petition);
    }

    let rows = sqlx::query(
        r#"
        SELECT id, petition_id, url
        FROM links
        WHERE petition_id = ANY($1)
        ORDER BY id ASC
        "#,
    )
    .bind(petition_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| RepositoryError::Database(format!("Failed to load links: {}", e)))?;

    for row in rows {
        let petition_id: i64 = row.get("petition_id");
        by_petition.entry(petition_id).or_default().push(Link {
            id: LinkId(row.get("id")),
            petition_id: PetitionId(petition_id),
            url: row.get("url"),
        });
    }
    Ok(by_petition)
}

async fn hydrate(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Petition>, RepositoryError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.get("id")).collect();
    let mut links = load_links(conn, &ids).await?;

    rows.iter()
        .map(|row| {
            let id: i64 = row.get("id");
            row_to_petition(row, links.remove(&id).unwrap_or_default())
        })
        .collect()
}

async fn hydrate_one(conn: &mut PgConnection, row: Option<PgRow>) -> Result<Option<Petition>, RepositoryError> {
    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

#[async_trait]
impl PetitionRepository for PostgresPetitionRepository {
    async fn insert(
        &self,
        petition: &NewPetition,
        cooldown_cutoff: DateTime<Utc>,
    ) -> Result<Petition, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(petition.user_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if owner.is_none() {
            return Err(RepositoryError::NotFound(format!("user {}", petition.user_id)));
        }

        let within_cooldown: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM petitions WHERE user_id = $1 AND created_at > $2)",
        )
        .bind(petition.user_id.0)
        .bind(cooldown_cutoff)
        .fetch_one(&mut *tx)
        .await?;
        if within_cooldown {
            return Err(RepositoryError::Conflict(format!(
                "user {} submitted a petition after {}",
                petition.user_id, cooldown_cutoff
            )));
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO petitions (user_id, title, category, content, status, view_count, agree_count, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, 0, $6)
            RETURNING {PETITION_COLUMNS}
            "#
        ))
        .bind(petition.user_id.0)
        .bind(&petition.title)
        .bind(&petition.category)
        .bind(&petition.content)
        .bind(PetitionStatus::Ongoing.as_str())
        .bind(petition.created_at)
        .fetch_one(&mut *tx)
        .await?;
        let petition_id: i64 = row.get("id");

        let mut links = Vec::with_capacity(petition.links.len());
        for url in &petition.links {
            let link_id: i64 = sqlx::query_scalar("INSERT INTO links (petition_id, url) VALUES ($1, $2) RETURNING id")
                .bind(petition_id)
                .bind(url)
                .fetch_one(&mut *tx)
                .await?;
            links.push(Link {
                id: LinkId(link_id),
                petition_id: PetitionId(petition_id),
                url: url.clone(),
            });
        }

        let created = row_to_petition(&row, links)?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!("SELECT {PETITION_COLUMNS} FROM petitions WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        hydrate_one(&mut *conn, row).await
    }

    async fn increment_view_count(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE petitions
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING {PETITION_COLUMNS}
            "#
        ))
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to count view: {}", e)))?;

        hydrate_one(&mut *conn, row).await
    }

    async fn find_latest_by_user(&self, user_id: UserId) -> Result<Option<Petition>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            r#"
            SELECT {PETITION_COLUMNS}
            FROM petitions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        hydrate_one(&mut *conn, row).await
    }

    async fn list(
        &self,
        status: Option<PetitionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Petition>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PETITION_COLUMNS}
            FROM petitions
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(offset.max(0))
        .bind(limit.max(0))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        hydrate(&mut *conn, rows).await
    }

    async fn update_status(
        &self,
        id: PetitionId,
        status: PetitionStatus,
    ) -> Result<Option<Petition>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            "UPDATE petitions SET status = $2 WHERE id = $1 RETURNING {PETITION_COLUMNS}"
        ))
        .bind(id.0)
        .bind(status.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to update status: {}", e)))?;

        hydrate_one(&mut *conn, row).await
    }

    async fn delete(&self, id: PetitionId) -> Result<Option<Petition>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {PETITION_COLUMNS} FROM petitions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(snapshot) = hydrate_one(&mut *tx, row).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM petitions WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete petition: {}", e)))?;

        tx.commit().await?;
        Ok(Some(snapshot))
    }
}
