// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! Cheongwon core
//!
//! Petition platform for a university community: members register with a
//! certified institutional email, submit petitions, agree with or report
//! other members' petitions, and administrators moderate.
//!
//! # Architecture
//!
//! - **domain** - records, policy, ports and configuration
//! - **application** - petition and user services
//! - **infrastructure** - repositories, event bus and external adapters
//! - **presentation** - axum HTTP API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
