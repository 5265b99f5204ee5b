// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server bootstrap: wires repositories, adapters and services from the
//! configuration, then serves the API until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use cheongwon_core::{
    application::{
        repository_factory::create_repositories, StandardPetitionService, StandardUserService,
    },
    domain::{
        config::PlatformConfigManifest,
        policy::{Clock, PolicySnapshot, SystemClock},
    },
    infrastructure::{
        event_bus::{EventBus, EventBusError, EventReceiver},
        Argon2PasswordHasher, InMemoryTokenBlacklist, UnivCertClient,
    },
    presentation::api::{self, AppState},
};

pub async fn start_server(config: PlatformConfigManifest) -> Result<()> {
    info!("Cheongwon server starting ({})", config.metadata.name);

    let backend = config
        .storage_backend()
        .context("Failed to resolve storage backend")?;
    let (repositories, _database) = create_repositories(&backend)
        .await
        .context("Failed to initialize storage")?;

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let _audit = spawn_audit_log(event_bus.subscribe());

    let api_key = config
        .certification_key()
        .context("Failed to resolve certification API key")?;
    if api_key.is_none() {
        warn!("No certification API key configured; registration and email codes will fail");
    }
    let certifier = Arc::new(
        UnivCertClient::from_config(&config.spec.certification, api_key)
            .context("Failed to build certification client")?,
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_revoker = Arc::new(InMemoryTokenBlacklist::default());
    let submission_policy = config.submission_policy();

    let petition_service = Arc::new(StandardPetitionService::new(
        repositories.users.clone(),
        repositories.petitions.clone(),
        repositories.agreements.clone(),
        repositories.reports.clone(),
        clock.clone(),
        submission_policy,
        event_bus.clone(),
    ));
    let user_service = Arc::new(StandardUserService::new(
        repositories.users.clone(),
        certifier,
        Arc::new(Argon2PasswordHasher),
        token_revoker.clone(),
        clock,
        event_bus.clone(),
    ));

    let app_state = AppState {
        petition_service,
        user_service,
        token_revoker,
        policy: PolicySnapshot::from_submission_policy(&submission_policy),
        metrics: install_metrics_recorder(),
        start_time: Instant::now(),
    };

    let app = api::app(Arc::new(app_state));

    let addr = format!("{}:{}", config.spec.server.bind_address, config.spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");

    Ok(())
}

fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe_counter!("cheongwon_petitions_created_total", "Petitions submitted");
            metrics::describe_counter!("cheongwon_agreements_total", "Agreements recorded");
            metrics::describe_counter!("cheongwon_reports_total", "Reports recorded");
            metrics::describe_counter!("cheongwon_users_registered_total", "Users registered");
            Some(handle)
        }
        Err(e) => {
            warn!("Prometheus recorder not installed, /metrics disabled: {}", e);
            None
        }
    }
}

/// Log every domain event until the bus closes.
fn spawn_audit_log(mut receiver: EventReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(event = ?event, "audit"),
                Err(EventBusError::Lagged(n)) => warn!("Audit log skipped {} events", n),
                Err(EventBusError::Closed) => break,
                Err(EventBusError::Empty) => continue,
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
