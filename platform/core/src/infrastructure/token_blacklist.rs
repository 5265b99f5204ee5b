// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! In-memory access-token blacklist.
//!
//! Each entry is retained for a fixed window that must cover the longest token
//! lifetime the gateway issues. Expired entries are swept lazily on insert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::domain::credentials::TokenRevoker;
use crate::domain::policy::REFRESH_COOKIE_MAX_AGE;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

pub struct InMemoryTokenBlacklist {
    /// Token to the instant its entry may be dropped.
    revoked: DashMap<String, Instant>,
    retention: Duration,
    started: Instant,
    last_cleanup_secs: AtomicU64,
}

impl InMemoryTokenBlacklist {
    pub fn new(retention: Duration) -> Self {
        Self {
            revoked: DashMap::new(),
            retention,
            started: Instant::now(),
            last_cleanup_secs: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    fn maybe_cleanup(&self) {
        let elapsed = self.started.elapsed().as_secs();
        let last = self.last_cleanup_secs.load(Ordering::Relaxed);
        if elapsed.saturating_sub(last) < CLEANUP_INTERVAL.as_secs() {
            return;
        }
        if self
            .last_cleanup_secs
            .compare_exchange(last, elapsed, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            self.cleanup();
        }
    }

    /// Drop every entry whose retention window has passed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        let removed = before.saturating_sub(self.revoked.len());
        if removed > 0 {
            info!("Dropped {} expired blacklist entries", removed);
        }
    }
}

impl Default for InMemoryTokenBlacklist {
    fn default() -> Self {
        Self::new(Duration::from_secs(REFRESH_COOKIE_MAX_AGE as u64))
    }
}

impl TokenRevoker for InMemoryTokenBlacklist {
    fn destroy_token(&self, username: &str, token: &str) {
        if token.is_empty() {
            return;
        }
        self.revoked
            .insert(token.to_string(), Instant::now() + self.retention);
        debug!(username = %username, "Access token revoked");
        self.maybe_cleanup();
    }

    fn is_revoked(&self, token: &str) -> bool {
        match self.revoked.get(token) {
            Some(expires_at) => *expires_at > Instant::now(),
            None => false,
        }
    }
}
