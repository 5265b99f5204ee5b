// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! `cheongwon migrate` - apply the embedded schema migrations

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use cheongwon_core::domain::config::PlatformConfigManifest;
use cheongwon_core::domain::repository::StorageBackend;
use cheongwon_core::infrastructure::db::Database;

pub async fn handle_command(config_path: Option<PathBuf>) -> Result<()> {
    let config = PlatformConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let postgres = match config.storage_backend()? {
        StorageBackend::PostgreSQL(postgres) => postgres,
        StorageBackend::InMemory => {
            bail!("No database configured; set spec.database.url or CHEONGWON_DATABASE_URL")
        }
    };

    println!("Applying migrations...");
    let database = Database::new(&postgres).await?;
    database.migrate().await?;

    println!("{}", "✓ Database schema is up to date".green());
    Ok(())
}
