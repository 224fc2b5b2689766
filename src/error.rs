//! Domain error types for the Shard Ledger
//!
//! Store operations are total and never return errors; everything here
//! belongs to the process boundary (configuration, listener, HTTP intake).
//!
//! main.rs is the ONLY module allowed to use anyhow::Result (process boundary).
//! All library code returns Result<T, LedgerError>.

use std::net::SocketAddr;
use thiserror::Error;

/// Ledger errors
///
/// Every variant carries structured context fields for diagnostics.
///
/// Example log output:
/// ```text
/// LedgerError::ReportTooLarge { shard_id: 3, count: 2000001, max: 1000000 }
/// → "report for shard 3 carries 2000001 IDs (max 1000000)"
/// ```
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration error (environment variable missing or invalid)
    #[error("configuration error: {0}")]
    Config(String),

    /// Shard report exceeds the configured intake limit
    #[error("report for shard {shard_id} carries {count} IDs (max {max})")]
    ReportTooLarge {
        shard_id: u64,
        count: usize,
        max: usize,
    },

    /// Query named a shard that has never reported
    #[error("shard {shard_id} has never reported")]
    UnknownShard { shard_id: u64 },

    /// HTTP listener could not bind
    #[error("failed to bind HTTP listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// HTTP server terminated with an I/O error
    #[error("HTTP server error")]
    Server(#[source] std::io::Error),

    /// Prometheus recorder could not be installed
    #[error("metrics recorder installation failed: {0}")]
    MetricsRecorder(String),
}

impl LedgerError {
    /// Returns a static label string suitable for Prometheus metrics.
    ///
    /// Used as the `error_type` label on `ledger_errors_total`.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::ReportTooLarge { .. } => "report_too_large",
            Self::UnknownShard { .. } => "unknown_shard",
            Self::Bind { .. } => "bind",
            Self::Server(_) => "server",
            Self::MetricsRecorder(_) => "metrics_recorder",
        }
    }
}
