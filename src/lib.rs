//! Shard Ledger - ownership bookkeeping for sharded worker pools
//!
//! Tracks which IDs each shard currently claims and answers reconciliation
//! questions over that membership:
//! - What changed since a shard's last report
//! - The complete deduplicated set of owned IDs
//! - How a proposed assignment differs from the current one
//! - Which IDs are claimed by more than one shard
//!
//! The table is memory-resident and rebuilt from reports after a restart.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;

pub use error::LedgerError;
pub use store::{
    AssignmentDelta, AssignmentDiff, Duplicates, ReportDelta, ShardId, ShardStore, ShardSummary,
};
