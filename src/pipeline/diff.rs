//! Snapshot comparison for change-driven notifications.
//!
//! Two different views of "changed" are used, and they intentionally do
//! not agree on every input:
//!
//! - [`snapshots_equal`] compares multisets: per-item counts must match.
//! - [`detect_change`] compares presence sets: only whether an item shows
//!   up at all. A duplicate disappearing is a deletion here, while a
//!   duplicate appearing is neither an addition nor a deletion.

use std::collections::{HashMap, HashSet};

use crate::models::{Snapshot, SnapshotItem};

/// How the new snapshot differs from the old one, by presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSummary {
    /// Some item in the new snapshot is absent from the old one
    pub has_additions: bool,
    /// No additions and the new snapshot is shorter
    pub is_only_deletion: bool,
}

/// What a run should do with the new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Same multiset; nothing to do
    Unchanged,
    /// Items only disappeared; persist without notifying
    PersistOnly,
    /// Render, notify, persist
    Notify,
}

fn counts(snapshot: &Snapshot) -> HashMap<&SnapshotItem, usize> {
    let mut counts = HashMap::new();
    for item in snapshot.items() {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Order-independent multiset equality.
pub fn snapshots_equal(a: &Snapshot, b: &Snapshot) -> bool {
    a.len() == b.len() && counts(a) == counts(b)
}

/// [`snapshots_equal`] over persisted text.
pub fn compare_snapshots(a: &str, b: &str) -> bool {
    snapshots_equal(&Snapshot::parse(a), &Snapshot::parse(b))
}

/// Items present in `new` but not in `old`, in `new` order, without repeats.
pub fn added_items<'a>(old: &Snapshot, new: &'a Snapshot) -> Vec<&'a SnapshotItem> {
    let old_set: HashSet<&SnapshotItem> = old.items().iter().collect();
    let mut seen = HashSet::new();
    new.items()
        .iter()
        .filter(|item| !old_set.contains(item) && seen.insert(*item))
        .collect()
}

/// Presence-set classification of `old -> new`.
pub fn summarize_change(old: &Snapshot, new: &Snapshot) -> ChangeSummary {
    let old_set: HashSet<&SnapshotItem> = old.items().iter().collect();
    let has_additions = new.items().iter().any(|item| !old_set.contains(item));

    ChangeSummary {
        has_additions,
        is_only_deletion: !has_additions && new.len() < old.len(),
    }
}

/// [`summarize_change`] over persisted text.
pub fn detect_change(old: &str, new: &str) -> ChangeSummary {
    summarize_change(&Snapshot::parse(old), &Snapshot::parse(new))
}

/// Decide what to do with a non-empty `new` snapshot given the `old` one.
pub fn decide(old: &Snapshot, new: &Snapshot) -> Decision {
    if snapshots_equal(new, old) {
        return Decision::Unchanged;
    }
    if summarize_change(old, new).is_only_deletion {
        Decision::PersistOnly
    } else {
        Decision::Notify
    }
}
