// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod db;
pub mod event_bus;
pub mod univcert_client;
pub mod token_blacklist;
pub mod password;

pub use event_bus::{DomainEvent, EventBus};
pub use password::Argon2PasswordHasher;
pub use token_blacklist::InMemoryTokenBlacklist;
pub use univcert_client::UnivCertClient;
