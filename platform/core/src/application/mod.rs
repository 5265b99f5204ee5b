// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod petition_service;
pub mod user_service;
pub mod repository_factory;

// Re-export services for convenience
pub use error::{DuplicateKind, InvalidStateReason, Resource, ServiceError};
pub use petition_service::{CreatePetitionRequest, PetitionResponse, PetitionService, StandardPetitionService};
pub use user_service::{SignupRequest, SignupResponse, StandardUserService, UserService};
