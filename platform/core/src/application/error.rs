// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Service-level errors.
//!
//! Every variant carries a stable machine code that clients can switch on;
//! the presentation layer maps variants to HTTP statuses.

use std::fmt;

use thiserror::Error;

use crate::domain::certification::CertificationError;
use crate::domain::credentials::CredentialError;
use crate::domain::petition::PetitionDraftError;
use crate::domain::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Petition,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::User => f.write_str("user"),
            Resource::Petition => f.write_str("petition"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    EmailAlreadyRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateReason {
    PetitionNotOngoing,
    AlreadyAgreed,
    AlreadyReported,
    SelfAgreementNotAllowed,
    SelfReportNotAllowed,
}

impl fmt::Display for InvalidStateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            InvalidStateReason::PetitionNotOngoing => "petition is not accepting agreements",
            InvalidStateReason::AlreadyAgreed => "petition already agreed by this user",
            InvalidStateReason::AlreadyReported => "petition already reported by this user",
            InvalidStateReason::SelfAgreementNotAllowed => "cannot agree to your own petition",
            InvalidStateReason::SelfReportNotAllowed => "cannot report your own petition",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("email is already registered")]
    Duplicate(DuplicateKind),

    #[error("{0}")]
    InvalidState(InvalidStateReason),

    #[error("a petition can be submitted only once every submission interval")]
    PetitionTooFrequent,

    #[error("email has not completed institutional certification")]
    EmailNotCertified,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Certification(#[from] CertificationError),

    #[error("credential error: {0}")]
    Credential(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(Resource::User) => "USER_NOT_FOUND",
            ServiceError::NotFound(Resource::Petition) => "PETITION_NOT_FOUND",
            ServiceError::Duplicate(DuplicateKind::EmailAlreadyRegistered) => "EMAIL_DUPLICATED",
            ServiceError::InvalidState(InvalidStateReason::PetitionNotOngoing) => "PETITION_NOT_ONGOING",
            ServiceError::InvalidState(InvalidStateReason::AlreadyAgreed) => "ALREADY_AGREED",
            ServiceError::InvalidState(InvalidStateReason::AlreadyReported) => "ALREADY_REPORTED",
            ServiceError::InvalidState(InvalidStateReason::SelfAgreementNotAllowed) => "SELF_AGREEMENT_NOT_ALLOWED",
            ServiceError::InvalidState(InvalidStateReason::SelfReportNotAllowed) => "SELF_REPORT_NOT_ALLOWED",
            ServiceError::PetitionTooFrequent => "PETITION_TOO_FREQUENT",
            ServiceError::EmailNotCertified => "EMAIL_UNCERTIFIED",
            ServiceError::Validation(_) => "INVALID_REQUEST",
            ServiceError::Certification(_) => "CERTIFICATION_UNAVAILABLE",
            ServiceError::Credential(_) => "CREDENTIAL_FAILURE",
            ServiceError::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PetitionDraftError> for ServiceError {
    fn from(err: PetitionDraftError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        ServiceError::Credential(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_reason() {
        let errors = [
            ServiceError::InvalidState(InvalidStateReason::PetitionNotOngoing),
            ServiceError::InvalidState(InvalidStateReason::AlreadyAgreed),
            ServiceError::InvalidState(InvalidStateReason::AlreadyReported),
            ServiceError::InvalidState(InvalidStateReason::SelfAgreementNotAllowed),
            ServiceError::InvalidState(InvalidStateReason::SelfReportNotAllowed),
        ];
        let mut codes: Vec<_> = errors.iter().map(ServiceError::code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_draft_error_is_validation() {
        let err: ServiceError = PetitionDraftError::Blank("title").into();
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert_eq!(err.to_string(), "invalid request: title must not be blank");
    }

    #[test]
    fn test_hashing_fault_is_not_an_auth_code() {
        let err: ServiceError = CredentialError::Hash("out of memory".to_string()).into();
        assert_eq!(err.code(), "CREDENTIAL_FAILURE");
    }
}
