// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Records, policy and ports of the petition platform. Nothing here depends
//! on a transport or a concrete store.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Business vocabulary and persistence contracts

pub mod user;
pub mod petition;
pub mod engagement;
pub mod policy;
pub mod events;
pub mod repository;
pub mod certification;
pub mod credentials;
pub mod config;
