//! Behavioural tests for the shard store public API
//!
//! Each test pins one reconciliation rule: report deltas, the ID union,
//! assignment diffs, duplicate detection, and concurrent intake.

use shard_ledger::{AssignmentDelta, ShardId, ShardStore};
use std::collections::{BTreeSet, HashMap};
use std::sync::Barrier;
use std::thread;

fn proposal(pairs: &[(&str, ShardId)]) -> HashMap<String, ShardId> {
    pairs.iter().map(|(id, shard)| (id.to_string(), *shard)).collect()
}

#[test]
fn report_dedupes_input_within_shard() {
    let store = ShardStore::new();
    let delta = store.report_ids(["a", "a", "b", "b"], 0);
    assert_eq!(delta.added, vec!["a", "b"]);
    assert!(delta.removed.is_empty());
}

#[test]
fn repeated_identical_report_is_empty_delta() {
    let store = ShardStore::new();
    store.report_ids(["x", "y"], 1);
    let delta = store.report_ids(["y", "x"], 1);
    assert!(delta.is_empty());
}

#[test]
fn report_yields_additions_and_removals() {
    let store = ShardStore::new();
    store.report_ids(["a", "b", "c"], 0);
    let delta = store.report_ids(["b", "c", "d"], 0);
    assert_eq!(delta.added, vec!["d"]);
    assert_eq!(delta.removed, vec!["a"]);
}

#[test]
fn empty_report_clears_shard() {
    let store = ShardStore::new();
    store.report_ids(["x"], 0);
    let delta = store.report_ids(Vec::<String>::new(), 0);
    assert!(delta.added.is_empty());
    assert_eq!(delta.removed, vec!["x"]);
    assert!(store.all().is_empty());
}

#[test]
fn cleared_id_survives_when_another_shard_holds_it() {
    let store = ShardStore::new();
    store.report_ids(["x"], 0);
    store.report_ids(["x"], 1);
    store.report_ids(Vec::<String>::new(), 0);
    assert_eq!(store.all(), vec!["x"]);
}

#[test]
fn report_replaces_rather_than_merges() {
    let store = ShardStore::new();
    store.report_ids(["a", "b"], 0);
    store.report_ids(["c"], 0);
    assert_eq!(store.shard_ids(0), Some(vec!["c".to_string()]));
}

#[test]
fn reports_for_other_shards_do_not_affect_delta() {
    let store = ShardStore::new();
    store.report_ids(["a"], 0);
    let delta = store.report_ids(["a"], 1);
    assert_eq!(delta.added, vec!["a"]);
}

#[test]
fn all_is_sorted_deduplicated_union() {
    let store = ShardStore::new();
    store.report_ids(["z", "a", "m"], 0);
    store.report_ids(["b", "a"], 1);
    assert_eq!(store.all(), vec!["a", "b", "m", "z"]);
}

#[test]
fn all_on_empty_store_is_empty() {
    assert!(ShardStore::new().all().is_empty());
}

#[test]
fn diff_reports_reassignment() {
    let store = ShardStore::new();
    store.report_ids(["a", "b"], 0);
    store.report_ids(["c"], 1);

    let diff = store.diff(&proposal(&[("a", 0), ("b", 1), ("c", 1)]));

    assert_eq!(diff.per_id.len(), 3);
    assert_eq!(
        diff.per_id["b"],
        AssignmentDelta {
            old_shard: Some(0),
            new_shard: Some(1),
            changed: true
        }
    );
    assert!(!diff.per_id["a"].changed);
    assert!(!diff.per_id["c"].changed);
    assert_eq!(diff.moved, vec!["b"]);
}

#[test]
fn diff_marks_new_id_changed_but_not_moved() {
    let store = ShardStore::new();
    store.report_ids(["a"], 0);

    let diff = store.diff(&proposal(&[("a", 0), ("b", 1)]));

    assert_eq!(
        diff.per_id["b"],
        AssignmentDelta {
            old_shard: None,
            new_shard: Some(1),
            changed: true
        }
    );
    assert!(diff.moved.is_empty());
    assert_eq!(diff.additions(), vec!["b"]);
}

#[test]
fn diff_against_empty_proposal_removes_everything() {
    let store = ShardStore::new();
    store.report_ids(["a"], 0);
    store.report_ids(["b"], 3);

    let diff = store.diff(&HashMap::new());

    assert_eq!(
        diff.per_id["a"],
        AssignmentDelta {
            old_shard: Some(0),
            new_shard: None,
            changed: true
        }
    );
    assert_eq!(diff.per_id["b"].old_shard, Some(3));
    assert!(diff.moved.is_empty());
    assert_eq!(diff.removals(), vec!["a", "b"]);
}

#[test]
fn diff_moved_is_sorted() {
    let store = ShardStore::new();
    store.report_ids(["q", "c", "k"], 0);

    let diff = store.diff(&proposal(&[("q", 1), ("c", 2), ("k", 1)]));
    assert_eq!(diff.moved, vec!["c", "k", "q"]);
}

#[test]
fn diff_of_matching_proposal_is_noop() {
    let store = ShardStore::new();
    store.report_ids(["a", "b"], 0);
    store.report_ids(["c"], 1);

    let diff = store.diff(&proposal(&[("a", 0), ("b", 0), ("c", 1)]));
    assert!(diff.is_noop());
    assert!(diff.moved.is_empty());
}

#[test]
fn duplicates_empty_when_ownership_is_exclusive() {
    let store = ShardStore::new();
    store.report_ids(["a"], 0);
    store.report_ids(["b"], 1);
    assert!(store.duplicates().is_empty());
}

#[test]
fn duplicates_lists_claimants_ascending() {
    let store = ShardStore::new();
    store.report_ids(["dup"], 2);
    store.report_ids(["a", "dup"], 0);
    store.report_ids(["dup", "b"], 1);

    let duplicates = store.duplicates();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates["dup"], vec![0, 1, 2]);
}

#[test]
fn duplicates_clear_after_shard_releases_id() {
    let store = ShardStore::new();
    store.report_ids(["dup"], 0);
    store.report_ids(["dup"], 1);
    store.report_ids(["other"], 1);
    assert!(store.duplicates().is_empty());
}

#[test]
fn concurrent_reports_keep_table_consistent() {
    const SHARDS: u64 = 8;
    const ROUNDS: usize = 50;

    let store = ShardStore::new();
    let barrier = Barrier::new(SHARDS as usize);

    thread::scope(|scope| {
        for shard in 0..SHARDS {
            let store = store.clone();
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let ids = vec![
                        "shared".to_string(),
                        format!("shard-{shard}"),
                        format!("round-{}", round % 3),
                    ];
                    store.report_ids(ids, shard);
                    let _ = store.all();
                    let _ = store.duplicates();
                }
            });
        }
    });

    // Every shard's final report used round ROUNDS - 1
    let last = format!("round-{}", (ROUNDS - 1) % 3);
    let mut expected: BTreeSet<String> = (0..SHARDS).map(|s| format!("shard-{s}")).collect();
    expected.insert("shared".to_string());
    expected.insert(last.clone());

    let all = store.all();
    assert_eq!(all, expected.into_iter().collect::<Vec<_>>());
    assert_eq!(store.shard_count(), SHARDS as usize);

    let duplicates = store.duplicates();
    let claimants: Vec<ShardId> = (0..SHARDS).collect();
    assert_eq!(duplicates["shared"], claimants);
    assert_eq!(duplicates[&last], claimants);
    assert_eq!(duplicates.len(), 2);
}

#[test]
fn concurrent_deltas_account_for_every_id() {
    let store = ShardStore::new();

    let deltas: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|shard| {
                let store = store.clone();
                scope.spawn(move || store.report_ids(["a", "b"], shard))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Each shard started empty, so each saw both IDs as additions
    for delta in deltas {
        assert_eq!(delta.added, vec!["a", "b"]);
        assert!(delta.removed.is_empty());
    }
    assert_eq!(store.all(), vec!["a", "b"]);
}
