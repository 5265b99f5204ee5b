// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Platform policy constants and the submission cooldown rule.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Minimum gap between two petitions from the same user.
pub const PETITION_SUBMISSION_INTERVAL_DAYS: i64 = 7;

/// Upper bound accepted for a configured submission interval.
pub const MAX_SUBMISSION_INTERVAL_DAYS: i64 = 3650;

/// Lifetime of the refresh-token cookie, in seconds.
pub const REFRESH_COOKIE_MAX_AGE: i64 = 7 * 24 * 60 * 60;

/// Lifetime of the verified-email cookie, in seconds.
pub const EMAIL_COOKIE_MAX_AGE: i64 = 10 * 60;

/// Nominal open period of a petition. No transition consumes it yet.
pub const PETITION_ACTIVE_PERIOD_DAYS: i64 = 30;

/// Agreement count a petition is expected to reach. No transition consumes it yet.
pub const AGREEMENT_THRESHOLD: i64 = 10;

/// Cooldown between successive petition submissions by one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    interval_days: i64,
}

impl SubmissionPolicy {
    /// The interval is clamped to `0..=MAX_SUBMISSION_INTERVAL_DAYS`.
    pub fn new(interval_days: i64) -> Self {
        Self {
            interval_days: interval_days.clamp(0, MAX_SUBMISSION_INTERVAL_DAYS),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::days(self.interval_days)
    }

    /// Whole elapsed days are compared, so 6 days 23 hours is still "6 days".
    pub fn allows(&self, last_submitted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        (now - last_submitted_at).num_days() >= self.interval_days
    }

    /// A prior petition created strictly after this instant blocks a new one.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.interval())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self::new(PETITION_SUBMISSION_INTERVAL_DAYS)
    }
}

/// Read-only snapshot of the policy table, served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PolicySnapshot {
    pub submission_interval_days: i64,
    pub refresh_cookie_max_age_seconds: i64,
    pub email_cookie_max_age_seconds: i64,
    pub petition_active_period_days: i64,
    pub agreement_threshold: i64,
}

impl PolicySnapshot {
    pub fn from_submission_policy(policy: &SubmissionPolicy) -> Self {
        Self {
            submission_interval_days: policy.interval_days,
            refresh_cookie_max_age_seconds: REFRESH_COOKIE_MAX_AGE,
            email_cookie_max_age_seconds: EMAIL_COOKIE_MAX_AGE,
            petition_active_period_days: PETITION_ACTIVE_PERIOD_DAYS,
            agreement_threshold: AGREEMENT_THRESHOLD,
        }
    }
}

/// Source of the current instant. Services never call `Utc::now()` directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
