// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::petition::{PetitionId, PetitionStatus};
use crate::domain::user::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PetitionEvent {
    PetitionCreated {
        petition_id: PetitionId,
        user_id: UserId,
        title: String,
        created_at: DateTime<Utc>,
    },
    PetitionAgreed {
        petition_id: PetitionId,
        user_id: UserId,
        agreed_at: DateTime<Utc>,
    },
    PetitionReported {
        petition_id: PetitionId,
        user_id: UserId,
        reported_at: DateTime<Utc>,
    },
    PetitionStatusChanged {
        petition_id: PetitionId,
        status: PetitionStatus,
        changed_at: DateTime<Utc>,
    },
    PetitionDeleted {
        petition_id: PetitionId,
        deleted_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UserEvent {
    UserRegistered {
        user_id: UserId,
        email: String,
        registered_at: DateTime<Utc>,
    },
    UserWithdrawn {
        email: String,
        withdrawn_at: DateTime<Utc>,
    },
}
