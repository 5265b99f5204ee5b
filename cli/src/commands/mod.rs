// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Cheongwon CLI

pub mod config;
pub mod migrate;
pub mod serve;

pub use self::config::ConfigCommand;
