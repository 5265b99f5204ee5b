// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! # Cheongwon
//!
//! The `cheongwon` binary runs the petition platform HTTP server and carries
//! the operator commands around it.
//!
//! ## Commands
//!
//! - `cheongwon serve` - Run the HTTP API
//! - `cheongwon migrate` - Apply database migrations
//! - `cheongwon config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cheongwon::commands::{self, ConfigCommand};
use cheongwon_core::domain::config::PlatformConfigManifest;

/// HUFS Cheongwon petition platform
#[derive(Parser)]
#[command(name = "cheongwon")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CHEONGWON_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API host (default: spec.server.bind_address)
    #[arg(long, global = true, env = "CHEONGWON_HOST")]
    host: Option<String>,

    /// HTTP API port (default: spec.server.port)
    #[arg(long, global = true, env = "CHEONGWON_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, env = "CHEONGWON_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    #[command(name = "serve")]
    Serve,

    /// Apply database migrations and exit
    #[command(name = "migrate")]
    Migrate,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside development
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = cli.log_level.clone().unwrap_or_else(|| configured_log_level(cli.config.clone()));
    init_logging(&level)?;

    match cli.command {
        Commands::Serve => commands::serve::handle_command(cli.config, cli.host, cli.port).await,
        Commands::Migrate => commands::migrate::handle_command(cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// `spec.logging.level` from the discovered config, or `info`.
fn configured_log_level(config_path: Option<PathBuf>) -> String {
    PlatformConfigManifest::load_or_default(config_path)
        .map(|config| config.spec.logging.level)
        .unwrap_or_else(|_| "info".to_string())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
