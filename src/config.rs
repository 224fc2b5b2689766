//! Ledger configuration module
//!
//! Loads settings from `LEDGER_*` environment variables (and a `.env` file
//! when present) layered over built-in defaults.

use crate::error::LedgerError;
use config::{Config, Environment};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "LEDGER";

/// Ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Address the HTTP surface binds to
    pub bind_addr: IpAddr,

    /// HTTP port for reports, queries, health and metrics
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Identifier of this ledger instance, for logs and health output
    pub instance_id: u64,

    /// Largest number of IDs accepted in a single shard report
    pub max_report_ids: usize,
}

impl LedgerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, LedgerError> {
        dotenvy::dotenv().ok();
        Self::load(None)
    }

    /// Load configuration from an explicit set of variables instead of the
    /// process environment
    pub fn from_map<I>(vars: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::load(Some(vars.into_iter().collect()))
    }

    /// Socket address for the HTTP listener
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }

    fn load(source: Option<config::Map<String, String>>) -> Result<Self, LedgerError> {
        let settings = Config::builder()
            .set_default("bind_addr", "0.0.0.0")
            .and_then(|b| b.set_default("http_port", 9090_i64))
            .and_then(|b| b.set_default("log_level", "info"))
            .and_then(|b| b.set_default("instance_id", 0_i64))
            .and_then(|b| b.set_default("max_report_ids", 1_000_000_i64))
            .map_err(|e| LedgerError::Config(format!("invalid default: {e}")))?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(source),
            )
            .build()
            .map_err(|e| LedgerError::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| LedgerError::Config(e.to_string()))?;

        if config.max_report_ids == 0 {
            return Err(LedgerError::Config(
                "LEDGER_MAX_REPORT_IDS must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}
