//! Result records returned by the shard store
//!
//! None of these are stored; each is built fresh by a store operation.

use serde::Serialize;
use std::collections::BTreeMap;

/// Identifier of a worker/partition
pub type ShardId = u64;

/// IDs claimed by more than one shard, keyed by ID, claimants ascending
pub type Duplicates = BTreeMap<String, Vec<ShardId>>;

/// Change in a shard's ID set caused by one report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportDelta {
    /// IDs present in the new report but not the previous one (ascending)
    pub added: Vec<String>,
    /// IDs present in the previous report but not the new one (ascending)
    pub removed: Vec<String>,
}

impl ReportDelta {
    /// Returns true if the report left the shard's set unchanged
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Per-ID comparison of the recorded owner against a proposed owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignmentDelta {
    /// Shard currently recorded as owning the ID, if any
    pub old_shard: Option<ShardId>,
    /// Shard the ID is proposed to move to, if any
    pub new_shard: Option<ShardId>,
    /// True when the two views disagree, including when either is absent
    pub changed: bool,
}

impl AssignmentDelta {
    pub(crate) fn between(old_shard: Option<ShardId>, new_shard: Option<ShardId>) -> Self {
        Self {
            old_shard,
            new_shard,
            changed: old_shard != new_shard,
        }
    }

    /// ID is proposed but not currently owned
    pub fn is_addition(&self) -> bool {
        self.old_shard.is_none() && self.new_shard.is_some()
    }

    /// ID is currently owned but absent from the proposal
    pub fn is_removal(&self) -> bool {
        self.old_shard.is_some() && self.new_shard.is_none()
    }

    /// ID is owned on both sides, by different shards
    pub fn is_move(&self) -> bool {
        matches!((self.old_shard, self.new_shard), (Some(old), Some(new)) if old != new)
    }
}

/// Outcome of comparing the current table with a proposed assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentDiff {
    /// Every ID seen in either view
    pub per_id: BTreeMap<String, AssignmentDelta>,
    /// IDs reassigned between two shards (ascending). Pure additions and
    /// removals are not listed here.
    pub moved: Vec<String>,
}

impl AssignmentDiff {
    /// IDs in the proposal that no shard currently owns (ascending)
    pub fn additions(&self) -> Vec<&str> {
        self.select(AssignmentDelta::is_addition)
    }

    /// IDs currently owned that the proposal drops (ascending)
    pub fn removals(&self) -> Vec<&str> {
        self.select(AssignmentDelta::is_removal)
    }

    /// Returns true if the proposal matches the current table exactly
    pub fn is_noop(&self) -> bool {
        self.per_id.values().all(|delta| !delta.changed)
    }

    fn select(&self, keep: impl Fn(&AssignmentDelta) -> bool) -> Vec<&str> {
        self.per_id
            .iter()
            .filter(|(_, delta)| keep(*delta))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Summary of one shard's entry in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShardSummary {
    pub shard_id: ShardId,
    pub id_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_delta_classification() {
        let moved = AssignmentDelta::between(Some(0), Some(1));
        assert!(moved.changed && moved.is_move());
        assert!(!moved.is_addition() && !moved.is_removal());

        let added = AssignmentDelta::between(None, Some(0));
        assert!(added.changed && added.is_addition() && !added.is_move());

        let removed = AssignmentDelta::between(Some(0), None);
        assert!(removed.changed && removed.is_removal() && !removed.is_move());

        let same = AssignmentDelta::between(Some(3), Some(3));
        assert!(!same.changed && !same.is_move());
    }

    #[test]
    fn test_shard_zero_is_not_absent() {
        // Shard 0 is a real owner, distinct from "no owner"
        let delta = AssignmentDelta::between(Some(0), None);
        assert_eq!(delta.old_shard, Some(0));
        assert!(delta.is_removal());
    }

    #[test]
    fn test_diff_additions_and_removals_sorted() {
        let mut diff = AssignmentDiff::default();
        diff.per_id.insert("z".into(), AssignmentDelta::between(None, Some(1)));
        diff.per_id.insert("b".into(), AssignmentDelta::between(None, Some(2)));
        diff.per_id.insert("q".into(), AssignmentDelta::between(Some(0), None));
        diff.per_id.insert("k".into(), AssignmentDelta::between(Some(0), Some(0)));

        assert_eq!(diff.additions(), vec!["b", "z"]);
        assert_eq!(diff.removals(), vec!["q"]);
        assert!(!diff.is_noop());
    }
}
