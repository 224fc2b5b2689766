//! Shard ownership ledger
//!
//! The membership table and the records its operations return.

mod ledger;
mod records;

pub use ledger::ShardStore;
pub use records::{
    AssignmentDelta, AssignmentDiff, Duplicates, ReportDelta, ShardId, ShardSummary,
};
