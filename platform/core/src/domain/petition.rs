// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! # Petition Aggregate
//!
//! A petition is owned by exactly one user and carries its supporting links as
//! an ordered value collection. Agreements and reports reference the petition
//! by foreign key only; they are queried, never embedded here.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Petition state, counters and draft validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetitionId(pub i64);

impl PetitionId {
    pub fn from_string(s: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self(s.trim().parse()?))
    }
}

impl std::fmt::Display for PetitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub i64);

/// Lifecycle state of a petition.
///
/// Only `Ongoing` accepts new agreements. Transitions out of `Ongoing` are
/// driven from outside the petition service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetitionStatus {
    Ongoing,
    Waiting,
    Answered,
    Closed,
}

impl PetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetitionStatus::Ongoing => "ongoing",
            PetitionStatus::Waiting => "waiting",
            PetitionStatus::Answered => "answered",
            PetitionStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ongoing" => Some(PetitionStatus::Ongoing),
            "waiting" => Some(PetitionStatus::Waiting),
            "answered" => Some(PetitionStatus::Answered),
            "closed" => Some(PetitionStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PetitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference URL attached to a petition at submission time. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub petition_id: PetitionId,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Petition {
    pub id: PetitionId,
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub content: String,
    pub status: PetitionStatus,
    pub view_count: i64,
    pub agree_count: i64,
    pub created_at: DateTime<Utc>,
    pub links: Vec<Link>,
}

impl Petition {
    pub fn is_ongoing(&self) -> bool {
        self.status == PetitionStatus::Ongoing
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Unsaved petition. Always starts `Ongoing` with zeroed counters.
#[derive(Debug, Clone)]
pub struct NewPetition {
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub content: String,
    pub links: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PetitionDraftError {
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("invalid link '{0}'")]
    InvalidLink(String),
}

impl NewPetition {
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
        links: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PetitionDraftError> {
        let draft = Self {
            user_id,
            title: title.into().trim().to_string(),
            category: category.into().trim().to_string(),
            content: content.into(),
            links: links
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            created_at,
        };
        draft.validate()?;
        Ok(draft)
    }

    fn validate(&self) -> Result<(), PetitionDraftError> {
        if self.title.is_empty() {
            return Err(PetitionDraftError::Blank("title"));
        }
        if self.category.is_empty() {
            return Err(PetitionDraftError::Blank("category"));
        }
        if self.content.trim().is_empty() {
            return Err(PetitionDraftError::Blank("content"));
        }
        for link in &self.links {
            match url::Url::parse(link) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => return Err(PetitionDraftError::InvalidLink(link.clone())),
            }
        }
        Ok(())
    }
}
