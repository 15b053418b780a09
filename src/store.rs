use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::Snapshot;

/// Snapshots collected during one run, one per date.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    by_date: BTreeMap<NaiveDate, Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a snapshot. A later snapshot for an existing date replaces the
    /// earlier one; returns true when that happened.
    pub fn insert(&mut self, snapshot: Snapshot) -> bool {
        self.by_date.insert(snapshot.date, snapshot).is_some()
    }

    /// Oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.by_date.values()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.by_date.values().next_back()
    }

    pub fn oldest(&self) -> Option<&Snapshot> {
        self.by_date.values().next()
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }
}

impl FromIterator<Snapshot> for SnapshotStore {
    fn from_iter<T: IntoIterator<Item = Snapshot>>(iter: T) -> Self {
        let mut store = Self::new();
        for snapshot in iter {
            store.insert(snapshot);
        }
        store
    }
}
