//! Shard membership table
//!
//! Holds, per shard, the set of IDs the shard last reported owning.
//! Reports replace a shard's set wholesale under the write lock; every
//! query runs under the shared read lock, so no query ever observes a
//! half-applied report.

use crate::store::records::{
    AssignmentDelta, AssignmentDiff, Duplicates, ReportDelta, ShardId, ShardSummary,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

type ShardTable = HashMap<ShardId, HashSet<String>>;

/// Shared membership table for all shards
///
/// Cloning is cheap and yields a handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct ShardStore {
    inner: Arc<RwLock<ShardTable>>,
}

impl ShardStore {
    /// Create an empty store with no shard entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a shard's ID set with `ids` and return what changed
    ///
    /// Duplicates in `ids` collapse. A shard never seen before starts from
    /// an empty set, and an empty `ids` clears the shard's set while keeping
    /// its entry.
    pub fn report_ids<I, S>(&self, ids: I, shard_id: ShardId) -> ReportDelta
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: HashSet<String> = ids.into_iter().map(Into::into).collect();
        let held = next.len();

        let (mut added, mut removed) = {
            let mut shards = self.inner.write();
            let current = shards.entry(shard_id).or_default();

            let added: Vec<String> = next
                .iter()
                .filter(|id| !current.contains(*id))
                .cloned()
                .collect();
            let previous = std::mem::replace(current, next);
            let removed: Vec<String> = previous
                .into_iter()
                .filter(|id| !current.contains(id))
                .collect();

            (added, removed)
        };

        added.sort_unstable();
        removed.sort_unstable();

        debug!(
            shard_id,
            held,
            added = added.len(),
            removed = removed.len(),
            "Shard report applied"
        );

        ReportDelta { added, removed }
    }

    /// Every ID owned by any shard, deduplicated, ascending
    pub fn all(&self) -> Vec<String> {
        let shards = self.inner.read();
        let unique: HashSet<&String> = shards.values().flatten().collect();
        let mut ids: Vec<String> = unique.into_iter().cloned().collect();
        drop(shards);

        ids.sort_unstable();
        ids
    }

    /// Compare the current table against a proposed ID → shard assignment
    ///
    /// An ID held by several shards is attributed to the lowest shard id
    /// when building the current view.
    pub fn diff(&self, proposed: &HashMap<String, ShardId>) -> AssignmentDiff {
        let current = self.flatten();
        let current_len = current.len();

        let mut per_id = BTreeMap::new();
        let mut moved = Vec::new();

        for (id, target) in proposed {
            if !current.contains_key(id) {
                per_id.insert(id.clone(), AssignmentDelta::between(None, Some(*target)));
            }
        }

        for (id, owner) in current {
            let delta = AssignmentDelta::between(Some(owner), proposed.get(&id).copied());
            if delta.is_move() {
                moved.push(id.clone());
            }
            per_id.insert(id, delta);
        }

        moved.sort_unstable();

        debug!(
            current = current_len,
            proposed = proposed.len(),
            moved = moved.len(),
            "Assignment diff computed"
        );

        AssignmentDiff { per_id, moved }
    }

    /// IDs claimed by two or more shards, with their claimants ascending
    pub fn duplicates(&self) -> Duplicates {
        let shards = self.inner.read();
        let mut claims: HashMap<&str, Vec<ShardId>> = HashMap::new();
        for (shard_id, ids) in shards.iter() {
            for id in ids {
                claims.entry(id.as_str()).or_default().push(*shard_id);
            }
        }

        let duplicates: Duplicates = claims
            .into_iter()
            .filter(|(_, claimants)| claimants.len() > 1)
            .map(|(id, mut claimants)| {
                claimants.sort_unstable();
                (id.to_string(), claimants)
            })
            .collect();
        duplicates
    }

    /// Snapshot of one shard's IDs (ascending), or None if it never reported
    pub fn shard_ids(&self, shard_id: ShardId) -> Option<Vec<String>> {
        let mut ids: Vec<String> = self.inner.read().get(&shard_id)?.iter().cloned().collect();
        ids.sort_unstable();
        Some(ids)
    }

    /// Every known shard with its ID count, ascending by shard id
    pub fn shards(&self) -> Vec<ShardSummary> {
        let mut summaries: Vec<ShardSummary> = self
            .inner
            .read()
            .iter()
            .map(|(shard_id, ids)| ShardSummary {
                shard_id: *shard_id,
                id_count: ids.len(),
            })
            .collect();
        summaries.sort_unstable_by_key(|s| s.shard_id);
        summaries
    }

    /// Number of shards that have reported at least once
    pub fn shard_count(&self) -> usize {
        self.inner.read().len()
    }

    /// Number of distinct IDs across all shards
    pub fn distinct_id_count(&self) -> usize {
        let shards = self.inner.read();
        let unique: HashSet<&String> = shards.values().flatten().collect();
        unique.len()
    }

    /// Returns true if no shard has ever reported
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Current view of ID → owner, lowest shard id winning on conflict
    fn flatten(&self) -> HashMap<String, ShardId> {
        let shards = self.inner.read();
        let mut owners: HashMap<String, ShardId> = HashMap::new();
        for (shard_id, ids) in shards.iter() {
            for id in ids {
                owners
                    .entry(id.clone())
                    .and_modify(|owner| *owner = (*owner).min(*shard_id))
                    .or_insert(*shard_id);
            }
        }
        owners
    }
}
