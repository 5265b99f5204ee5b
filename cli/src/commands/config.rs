// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use cheongwon_core::domain::config::PlatformConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with every default spelled out
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./cheongwon-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

fn redact(value: &str) -> String {
    if value.starts_with("env:") {
        value.to_string()
    } else {
        "********".to_string()
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = PlatformConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. CHEONGWON_CONFIG_PATH: {}",
            std::env::var("CHEONGWON_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./cheongwon-config.yaml");
        println!("  4. ~/.cheongwon/config.yaml");
        println!("  5. /etc/cheongwon/config.yaml");
        println!();
    }

    let mut redacted = config.clone();
    if let Some(db) = redacted.spec.database.as_mut() {
        db.url = redact(&db.url);
    }
    if let Some(key) = redacted.spec.certification.api_key.as_mut() {
        *key = redact(key);
    }

    if as_yaml {
        let yaml = serde_yaml::to_string(&redacted).context("Failed to serialize configuration")?;
        println!("{}", yaml);
        return Ok(());
    }

    let spec = &redacted.spec;
    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", redacted.metadata.name);
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!();

    println!("{}", "Storage:".bold());
    match &spec.database {
        Some(db) => {
            println!("  Backend: PostgreSQL");
            println!("  URL: {}", db.url);
            println!("  Max connections: {}", db.max_connections);
        }
        None => println!("  Backend: {}", "in-memory (data is lost on restart)".yellow()),
    }
    println!();

    println!("{}", "Certification:".bold());
    println!("  Endpoint: {}", spec.certification.base_url);
    println!("  Institution: {}", spec.certification.org_name);
    println!(
        "  API key: {}",
        spec.certification.api_key.as_deref().unwrap_or("(not set)")
    );
    println!();

    println!("{}", "Policy:".bold());
    println!(
        "  Submission interval: {} days",
        spec.policy.submission_interval_days
    );
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = PlatformConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    if config.certification_key()?.is_none() {
        println!(
            "{}",
            "WARNING: no certification API key; registration will fail".yellow()
        );
    }

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    PlatformConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
