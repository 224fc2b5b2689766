//! Prometheus metrics module
//!
//! Counters for report intake and diff traffic, gauges describing the
//! table, refreshed on every scrape.

use crate::error::LedgerError;
use crate::store::{ReportDelta, ShardId, ShardStore};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;

/// Ledger metrics collector
#[derive(Clone)]
pub struct LedgerMetrics {
    handle: Arc<PrometheusHandle>,
}

impl LedgerMetrics {
    /// Install the global Prometheus recorder and return a handle to it
    pub fn install() -> Result<Self, LedgerError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| LedgerError::MetricsRecorder(e.to_string()))?;

        Self::register_metrics();

        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    /// Build a recorder without installing it globally
    ///
    /// Recording calls become no-ops unless another recorder is installed;
    /// `render` still works. Used where several instances coexist (tests).
    pub fn detached() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        Self {
            handle: Arc::new(recorder.handle()),
        }
    }

    /// Register metric descriptions
    fn register_metrics() {
        describe_counter!(
            "ledger_reports_total",
            Unit::Count,
            "Total shard reports applied"
        );
        describe_counter!(
            "ledger_ids_added_total",
            Unit::Count,
            "IDs newly claimed by a shard report"
        );
        describe_counter!(
            "ledger_ids_removed_total",
            Unit::Count,
            "IDs dropped by a shard report"
        );
        describe_counter!(
            "ledger_diff_moved_total",
            Unit::Count,
            "IDs reported as moved by assignment diffs"
        );
        describe_counter!(
            "ledger_errors_total",
            Unit::Count,
            "Total ledger errors"
        );

        describe_histogram!(
            "ledger_report_duration_seconds",
            Unit::Seconds,
            "Time to apply a shard report"
        );

        describe_gauge!(
            "ledger_shards_tracked",
            Unit::Count,
            "Shards with an entry in the table"
        );
        describe_gauge!(
            "ledger_ids_tracked",
            Unit::Count,
            "Distinct IDs owned across all shards"
        );
        describe_gauge!(
            "ledger_duplicate_ids",
            Unit::Count,
            "IDs claimed by more than one shard"
        );
    }

    /// Record an applied shard report
    pub fn record_report(&self, shard_id: ShardId, delta: &ReportDelta, duration: Duration) {
        let shard = shard_id.to_string();

        counter!("ledger_reports_total", "shard_id" => shard.clone()).increment(1);
        counter!("ledger_ids_added_total", "shard_id" => shard.clone())
            .increment(delta.added.len() as u64);
        counter!("ledger_ids_removed_total", "shard_id" => shard)
            .increment(delta.removed.len() as u64);

        histogram!("ledger_report_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record the number of moves found by a diff
    pub fn record_diff(&self, moved: usize) {
        counter!("ledger_diff_moved_total").increment(moved as u64);
    }

    /// Record a ledger error by its label
    pub fn record_error(&self, error_type: &'static str) {
        counter!("ledger_errors_total", "error_type" => error_type).increment(1);
    }

    /// Refresh table gauges from the store
    pub fn observe_store(&self, store: &ShardStore) {
        gauge!("ledger_shards_tracked").set(store.shard_count() as f64);
        gauge!("ledger_ids_tracked").set(store.distinct_id_count() as f64);
        gauge!("ledger_duplicate_ids").set(store.duplicates().len() as f64);
    }

    /// Render metrics in Prometheus format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
