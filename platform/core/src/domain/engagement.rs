// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Agreement and report records.
//!
//! Both are join records keyed by a unique (user, petition) pair. They hold
//! plain foreign keys; the petition's agreement counter is maintained by the
//! store in the same unit of work that inserts the agreement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::petition::PetitionId;
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgreementId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub i64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub user_id: UserId,
    pub petition_id: PetitionId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub petition_id: PetitionId,
    pub created_at: DateTime<Utc>,
}
