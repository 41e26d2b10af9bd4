//! Process records and immutable snapshots of the process table.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One running process as seen by a snapshot.
///
/// Diffing matches on `name` only; `pid` is reported but never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Executable name as reported by the OS.
    pub name: String,
    /// Process ID.
    pub pid: u32,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }
}

/// The process table at one instant.
///
/// Records are shared behind an `Arc`, so cloning a snapshot (for example when
/// it becomes a session's baseline) does not copy the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    records: Arc<[ProcessRecord]>,
}

impl Snapshot {
    /// An empty snapshot, used as the baseline of a new session.
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessRecord> {
        self.records.iter()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<ProcessRecord>> for Snapshot {
    fn from(records: Vec<ProcessRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl FromIterator<ProcessRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ProcessRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a ProcessRecord;
    type IntoIter = std::slice::Iter<'a, ProcessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
