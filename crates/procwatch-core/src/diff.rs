//! Snapshot diffing.
//!
//! Two snapshots are compared by process name. A name present only in the
//! current snapshot is "started", a name present only in the previous one is
//! "ended". PIDs ride along for reporting; a process that restarts under the
//! same name between two snapshots is not reported.

use crate::process::{ProcessRecord, Snapshot};
use chrono::{DateTime, Local};
use std::collections::HashSet;

/// Result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Records whose name is new in the current snapshot, in snapshot order.
    pub started: Vec<ProcessRecord>,
    /// Records whose name disappeared since the previous snapshot, in snapshot order.
    pub ended: Vec<ProcessRecord>,
    /// When the comparison was made.
    pub observed_at: DateTime<Local>,
}

impl DiffResult {
    /// Nothing started and nothing ended.
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.ended.is_empty()
    }
}

/// Compare `previous` against `current`.
///
/// Runs in O(|previous| + |current|). Each name is reported at most once per
/// side, using the first record that carries it. Neither input is modified.
pub fn compare(previous: &Snapshot, current: &Snapshot) -> DiffResult {
    DiffResult {
        started: missing_from(current, previous),
        ended: missing_from(previous, current),
        observed_at: Local::now(),
    }
}

/// Records of `from` whose name does not occur in `other`, one per name.
fn missing_from(from: &Snapshot, other: &Snapshot) -> Vec<ProcessRecord> {
    let known: HashSet<&str> = other.iter().map(|r| r.name.as_str()).collect();
    let mut reported: HashSet<&str> = HashSet::new();

    from.iter()
        .filter(|r| !known.contains(r.name.as_str()) && reported.insert(r.name.as_str()))
        .cloned()
        .collect()
}
