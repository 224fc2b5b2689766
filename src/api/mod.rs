//! HTTP surface
//!
//! Thin JSON front for the shard store plus health, readiness and
//! Prometheus endpoints. Every handler maps directly onto one store
//! operation.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::metrics::LedgerMetrics;
use crate::store::{AssignmentDiff, Duplicates, ShardId, ShardStore, ShardSummary};
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub instance_id: u64,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub instance_id: u64,
    pub shards_total: usize,
    pub ids_total: usize,
}

/// Body of a shard report; a missing or null `ids` is an empty report
#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

/// Result of an applied shard report
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report_id: String,
    pub shard_id: ShardId,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ShardIdsResponse {
    pub shard_id: ShardId,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ShardsResponse {
    pub shards: Vec<ShardSummary>,
}

#[derive(Debug, Serialize)]
pub struct IdsResponse {
    pub ids: Vec<String>,
}

/// Proposed ID → shard assignment to compare against the table
#[derive(Debug, Default, Deserialize)]
pub struct DiffRequest {
    #[serde(default)]
    pub assignments: HashMap<String, ShardId>,
}

#[derive(Debug, Serialize)]
pub struct DuplicatesResponse {
    pub duplicates: Duplicates,
}

/// Error body for every non-2xx ledger response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: &'static str,
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            LedgerError::ReportTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            LedgerError::UnknownShard { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_type: self.error_type_label(),
        };

        (status, Json(body)).into_response()
    }
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: ShardStore,
    pub metrics: Arc<LedgerMetrics>,
    pub instance_id: u64,
    pub max_report_ids: usize,
}

impl AppState {
    pub fn new(store: ShardStore, metrics: Arc<LedgerMetrics>, config: &LedgerConfig) -> Self {
        Self {
            store,
            metrics,
            instance_id: config.instance_id,
            max_report_ids: config.max_report_ids,
        }
    }
}

/// Create the ledger router
///
/// Report size is bounded by ID count (`max_report_ids`) in the report
/// handler, so the extractor's byte limit is lifted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .route("/shards", get(shards_handler))
        .route(
            "/shards/{shard_id}/ids",
            get(shard_ids_handler).put(report_handler),
        )
        .route("/ids", get(all_handler))
        .route("/diff", post(diff_handler))
        .route("/duplicates", get(duplicates_handler))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Health endpoint - always returns 200 if process is running
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        instance_id: state.instance_id,
    })
}

/// Readiness endpoint - the table is usable as soon as it exists
async fn ready_handler(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        instance_id: state.instance_id,
        shards_total: state.store.shard_count(),
        ids_total: state.store.distinct_id_count(),
    })
}

/// Metrics endpoint - returns Prometheus format metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.observe_store(&state.store);

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.render(),
    )
}

/// Replace a shard's ID set with the reported one
async fn report_handler(
    State(state): State<AppState>,
    Path(shard_id): Path<ShardId>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, LedgerError> {
    let ids = request.ids.unwrap_or_default();

    if ids.len() > state.max_report_ids {
        let err = LedgerError::ReportTooLarge {
            shard_id,
            count: ids.len(),
            max: state.max_report_ids,
        };
        state.metrics.record_error(err.error_type_label());
        warn!(
            shard_id,
            count = ids.len(),
            max = state.max_report_ids,
            "Rejected oversized shard report"
        );
        return Err(err);
    }

    let report_id = Uuid::new_v4();
    let start = Instant::now();
    let delta = state.store.report_ids(ids, shard_id);
    state.metrics.record_report(shard_id, &delta, start.elapsed());

    info!(
        %report_id,
        shard_id,
        added = delta.added.len(),
        removed = delta.removed.len(),
        "Shard report accepted"
    );

    Ok(Json(ReportResponse {
        report_id: report_id.to_string(),
        shard_id,
        added: delta.added,
        removed: delta.removed,
    }))
}

/// IDs currently held by one shard
async fn shard_ids_handler(
    State(state): State<AppState>,
    Path(shard_id): Path<ShardId>,
) -> Result<Json<ShardIdsResponse>, LedgerError> {
    let ids = state.store.shard_ids(shard_id).ok_or_else(|| {
        debug!(shard_id, "Lookup for unknown shard");
        LedgerError::UnknownShard { shard_id }
    })?;

    Ok(Json(ShardIdsResponse { shard_id, ids }))
}

async fn shards_handler(State(state): State<AppState>) -> Json<ShardsResponse> {
    Json(ShardsResponse {
        shards: state.store.shards(),
    })
}

async fn all_handler(State(state): State<AppState>) -> Json<IdsResponse> {
    Json(IdsResponse {
        ids: state.store.all(),
    })
}

/// Compare a proposed assignment with the current table
async fn diff_handler(
    State(state): State<AppState>,
    Json(request): Json<DiffRequest>,
) -> Json<AssignmentDiff> {
    let diff = state.store.diff(&request.assignments);
    state.metrics.record_diff(diff.moved.len());
    Json(diff)
}

async fn duplicates_handler(State(state): State<AppState>) -> Json<DuplicatesResponse> {
    let duplicates = state.store.duplicates();
    if !duplicates.is_empty() {
        warn!(count = duplicates.len(), "IDs claimed by more than one shard");
    }
    Json(DuplicatesResponse { duplicates })
}
