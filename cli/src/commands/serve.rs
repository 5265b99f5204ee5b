// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! `cheongwon serve`

use anyhow::{Context, Result};
use std::path::PathBuf;

use cheongwon_core::domain::config::PlatformConfigManifest;

use crate::server::start_server;

pub async fn handle_command(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = PlatformConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    if let Some(host) = host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    start_server(config).await
}
