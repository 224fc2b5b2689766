//! Shard Ledger - HTTP service around the shard ownership table
//!
//! This process:
//! - Accepts full-replacement ID reports from shards
//! - Answers union, assignment-diff and duplicate queries
//! - Exposes health/ready endpoints for Kubernetes
//! - Exports Prometheus metrics for observability
//!
//! State is memory-resident; shards rebuild it by re-reporting after a restart.

use anyhow::Result;
use shard_ledger::api::{self, AppState};
use shard_ledger::config::LedgerConfig;
use shard_ledger::error::LedgerError;
use shard_ledger::metrics::LedgerMetrics;
use shard_ledger::store::ShardStore;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first to get log level
    let config = LedgerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("shard_ledger={}", config.log_level).parse()?)
                .add_directive("hyper=warn".parse()?),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        instance_id = config.instance_id,
        max_report_ids = config.max_report_ids,
        "Starting Shard Ledger"
    );

    let metrics = Arc::new(LedgerMetrics::install()?);
    info!("Prometheus metrics initialized");

    let store = ShardStore::new();
    let app_state = AppState::new(store, Arc::clone(&metrics), &config);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| LedgerError::Bind { addr, source })?;

    info!(%addr, "Starting HTTP server");

    if let Err(e) = axum::serve(listener, api::router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        let err = LedgerError::Server(e);
        metrics.record_error(err.error_type_label());
        error!(error = %err, "HTTP server error");
        return Err(err.into());
    }

    info!("Ledger shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
