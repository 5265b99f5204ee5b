// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Petition Service
//!
//! Application service for the petition lifecycle: submission, detail views,
//! agreements, reports and administrative moderation.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Enforce petition business rules and order their errors
//! - **Collaborators:**
//!   - Domain: `Petition`, `SubmissionPolicy`, `Clock`
//!   - Infrastructure: the four repositories, `EventBus`
//!
//! # Rule Ordering
//!
//! Checks run in a fixed order. For agreements: user, petition, `Ongoing`
//! status, duplicate pair, ownership. For reports: user, petition, duplicate pair, ownership.
//! The repository repeats the status, duplicate and cooldown checks inside its
//! unit of work; a lost race maps onto the error the pre-check would have
//! produced.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::error::{InvalidStateReason, Resource, ServiceError};
use crate::domain::engagement::{Agreement, Report};
use crate::domain::events::PetitionEvent;
use crate::domain::petition::{NewPetition, Petition, PetitionId, PetitionStatus};
use crate::domain::policy::{Clock, SubmissionPolicy};
use crate::domain::repository::{
    AgreementRepository, PetitionRepository, ReportRepository, RepositoryError, UserRepository,
};
use crate::domain::user::UserId;
use crate::infrastructure::event_bus::EventBus;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Petition submission payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePetitionRequest {
    pub title: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub links: Vec<String>,
}

/// Client-facing view of a petition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PetitionResponse {
    pub petition_id: PetitionId,
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub content: String,
    pub status: PetitionStatus,
    pub view_count: i64,
    pub agree_count: i64,
    pub created_at: DateTime<Utc>,
    pub links: Vec<String>,
}

impl From<&Petition> for PetitionResponse {
    fn from(petition: &Petition) -> Self {
        Self {
            petition_id: petition.id,
            user_id: petition.user_id,
            title: petition.title.clone(),
            category: petition.category.clone(),
            content: petition.content.clone(),
            status: petition.status,
            view_count: petition.view_count,
            agree_count: petition.agree_count,
            created_at: petition.created_at,
            links: petition.links.iter().map(|l| l.url.clone()).collect(),
        }
    }
}

impl From<Petition> for PetitionResponse {
    fn from(petition: Petition) -> Self {
        PetitionResponse::from(&petition)
    }
}

#[async_trait]
pub trait PetitionService: Send + Sync {
    /// Petition detail. Every call counts one view.
    async fn get_petition(&self, petition_id: PetitionId) -> Result<Petition, ServiceError>;

    async fn create_petition(
        &self,
        request: CreatePetitionRequest,
        user_id: UserId,
    ) -> Result<Petition, ServiceError>;

    async fn agree_petition(&self, petition_id: PetitionId, user_id: UserId) -> Result<Agreement, ServiceError>;

    async fn report_petition(&self, petition_id: PetitionId, user_id: UserId) -> Result<Report, ServiceError>;

    async fn has_user_agreed_petition(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, ServiceError>;

    async fn has_user_reported_petition(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, ServiceError>;

    /// Hard delete. Returns the petition as it was just before removal.
    async fn delete_petition(&self, petition_id: PetitionId) -> Result<PetitionResponse, ServiceError>;

    /// Newest first; `page` is zero-based. Does not count views.
    async fn list_petitions(
        &self,
        status: Option<PetitionStatus>,
        page: i64,
        size: i64,
    ) -> Result<Vec<Petition>, ServiceError>;

    async fn update_status(&self, petition_id: PetitionId, status: PetitionStatus) -> Result<Petition, ServiceError>;
}

pub struct StandardPetitionService {
    users: Arc<dyn UserRepository>,
    petitions: Arc<dyn PetitionRepository>,
    agreements: Arc<dyn AgreementRepository>,
    reports: Arc<dyn ReportRepository>,
    clock: Arc<dyn Clock>,
    policy: SubmissionPolicy,
    event_bus: Arc<EventBus>,
}

impl StandardPetitionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        petitions: Arc<dyn PetitionRepository>,
        agreements: Arc<dyn AgreementRepository>,
        reports: Arc<dyn ReportRepository>,
        clock: Arc<dyn Clock>,
        policy: SubmissionPolicy,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            users,
            petitions,
            agreements,
            reports,
            clock,
            policy,
            event_bus,
        }
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), ServiceError> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(Resource::User)),
        }
    }

    async fn require_petition(&self, petition_id: PetitionId) -> Result<Petition, ServiceError> {
        self.petitions
            .find_by_id(petition_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Petition))
    }
}

#[async_trait]
impl PetitionService for StandardPetitionService {
    async fn get_petition(&self, petition_id: PetitionId) -> Result<Petition, ServiceError> {
        let petition = self
            .petitions
            .increment_view_count(petition_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Petition))?;

        debug!(petition_id = %petition_id, view_count = petition.view_count, "Petition viewed");
        Ok(petition)
    }

    async fn create_petition(
        &self,
        request: CreatePetitionRequest,
        user_id: UserId,
    ) -> Result<Petition, ServiceError> {
        self.require_user(user_id).await?;

        let now = self.clock.now();
        if let Some(last) = self.petitions.find_latest_by_user(user_id).await? {
            if !self.policy.allows(last.created_at, now) {
                info!(user_id = %user_id, last_petition_id = %last.id, "Petition submission refused by cooldown");
                return Err(ServiceError::PetitionTooFrequent);
            }
        }

        let draft = NewPetition::new(
            user_id,
            request.title,
            request.category,
            request.content,
            request.links,
            now,
        )?;

        let petition = self
            .petitions
            .insert(&draft, self.policy.cutoff(now))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::PetitionTooFrequent,
                RepositoryError::NotFound(_) => ServiceError::NotFound(Resource::User),
                other => ServiceError::Repository(other),
            })?;

        info!(
            petition_id = %petition.id,
            user_id = %user_id,
            links = petition.links.len(),
            "Petition created"
        );
        metrics::counter!("cheongwon_petitions_created_total").increment(1);
        self.event_bus.publish_petition_event(PetitionEvent::PetitionCreated {
            petition_id: petition.id,
            user_id,
            title: petition.title.clone(),
            created_at: petition.created_at,
        });

        Ok(petition)
    }

    async fn agree_petition(&self, petition_id: PetitionId, user_id: UserId) -> Result<Agreement, ServiceError> {
        self.require_user(user_id).await?;
        let petition = self.require_petition(petition_id).await?;

        if !petition.is_ongoing() {
            return Err(ServiceError::InvalidState(InvalidStateReason::PetitionNotOngoing));
        }
        if self.agreements.exists(user_id, petition_id).await? {
            return Err(ServiceError::InvalidState(InvalidStateReason::AlreadyAgreed));
        }
        if petition.is_owned_by(user_id) {
            return Err(ServiceError::InvalidState(InvalidStateReason::SelfAgreementNotAllowed));
        }

        let agreement = self
            .agreements
            .create(user_id, petition_id, self.clock.now())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::InvalidState(InvalidStateReason::AlreadyAgreed),
                RepositoryError::StaleState(_) => ServiceError::InvalidState(InvalidStateReason::PetitionNotOngoing),
                RepositoryError::NotFound(_) => ServiceError::NotFound(Resource::Petition),
                other => ServiceError::Repository(other),
            })?;

        info!(petition_id = %petition_id, user_id = %user_id, "Petition agreed");
        metrics::counter!("cheongwon_agreements_total").increment(1);
        self.event_bus.publish_petition_event(PetitionEvent::PetitionAgreed {
            petition_id,
            user_id,
            agreed_at: agreement.created_at,
        });

        Ok(agreement)
    }

    async fn report_petition(&self, petition_id: PetitionId, user_id: UserId) -> Result<Report, ServiceError> {
        self.require_user(user_id).await?;
        let petition = self.require_petition(petition_id).await?;

        if self.reports.exists(user_id, petition_id).await? {
            return Err(ServiceError::InvalidState(InvalidStateReason::AlreadyReported));
        }
        if petition.is_owned_by(user_id) {
            return Err(ServiceError::InvalidState(InvalidStateReason::SelfReportNotAllowed));
        }

        let report = self
            .reports
            .create(user_id, petition_id, self.clock.now())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::InvalidState(InvalidStateReason::AlreadyReported),
                RepositoryError::NotFound(_) => ServiceError::NotFound(Resource::Petition),
                other => ServiceError::Repository(other),
            })?;

        warn!(petition_id = %petition_id, user_id = %user_id, "Petition reported");
        metrics::counter!("cheongwon_reports_total").increment(1);
        self.event_bus.publish_petition_event(PetitionEvent::PetitionReported {
            petition_id,
            user_id,
            reported_at: report.created_at,
        });

        Ok(report)
    }

    async fn has_user_agreed_petition(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, ServiceError> {
        Ok(self.agreements.exists(user_id, petition_id).await?)
    }

    async fn has_user_reported_petition(&self, user_id: UserId, petition_id: PetitionId) -> Result<bool, ServiceError> {
        Ok(self.reports.exists(user_id, petition_id).await?)
    }

    async fn delete_petition(&self, petition_id: PetitionId) -> Result<PetitionResponse, ServiceError> {
        let snapshot = self
            .petitions
            .delete(petition_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Petition))?;

        info!(petition_id = %petition_id, owner = %snapshot.user_id, "Petition deleted");
        self.event_bus.publish_petition_event(PetitionEvent::PetitionDeleted {
            petition_id,
            deleted_at: self.clock.now(),
        });

        Ok(PetitionResponse::from(snapshot))
    }

    async fn list_petitions(
        &self,
        status: Option<PetitionStatus>,
        page: i64,
        size: i64,
    ) -> Result<Vec<Petition>, ServiceError> {
        if page < 0 {
            return Err(ServiceError::Validation("page must not be negative".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(ServiceError::Validation(format!(
                "size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let offset = page.saturating_mul(size);
        Ok(self.petitions.list(status, offset, size).await?)
    }

    async fn update_status(&self, petition_id: PetitionId, status: PetitionStatus) -> Result<Petition, ServiceError> {
        let petition = self
            .petitions
            .update_status(petition_id, status)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Petition))?;

        info!(petition_id = %petition_id, status = %status, "Petition status changed");
        self.event_bus.publish_petition_event(PetitionEvent::PetitionStatusChanged {
            petition_id,
            status,
            changed_at: self.clock.now(),
        });

        Ok(petition)
    }
}
