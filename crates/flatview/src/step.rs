//! Step transaction bookkeeping.
//!
//! Rows staged during an open step wait in [`PendingRows`] until the commit
//! folds them into the position index. Staging keeps first-arrival order,
//! which is the order new rows take when the view is unsorted.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{
    key::{RowEntry, SortKey},
    source::PrimaryKey,
};

/// State of the step state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepPhase {
    #[default]
    Idle,
    Open,
}

/// Counters for the current (or last committed) step.
///
/// These are statistics, not row counts: staging the same key twice counts
/// two inserts but yields one row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub inserts: usize,
    pub deletes: usize,
}

/// Staged rows keyed by primary key, last write wins.
#[derive(Debug)]
pub(crate) struct PendingRows<K> {
    slots: HashMap<K, usize, FxBuildHasher>,
    rows: Vec<Option<RowEntry<K>>>,
}

impl<K> Default for PendingRows<K> {
    fn default() -> Self {
        Self {
            slots: HashMap::default(),
            rows: Vec::new(),
        }
    }
}

impl<K: PrimaryKey> PendingRows<K> {
    /// Stage a row, replacing any row already staged under the same key.
    pub(crate) fn stage(&mut self, entry: RowEntry<K>) {
        if let Some(&slot) = self.slots.get(&entry.key) {
            self.rows[slot] = Some(entry);
        } else {
            self.slots.insert(entry.key.clone(), self.rows.len());
            self.rows.push(Some(entry));
        }
    }

    /// Drop the staged row for `key`. Returns `true` if one was staged.
    pub(crate) fn cancel(&mut self, key: &K) -> bool {
        match self.slots.remove(key) {
            Some(slot) => self.rows[slot].take().is_some(),
            None => false,
        }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of rows currently staged.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Take every staged row in first-arrival order, leaving the set empty.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = RowEntry<K>> + '_ {
        self.slots.clear();
        self.rows.drain(..).flatten()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.rows.clear();
    }
}

/// Comparison keys of committed rows as they were before the open step
/// rewrote them in place.
#[derive(Debug)]
pub(crate) struct RewriteLog<K> {
    originals: HashMap<K, SortKey, FxBuildHasher>,
}

impl<K> Default for RewriteLog<K> {
    fn default() -> Self {
        Self {
            originals: HashMap::default(),
        }
    }
}

impl<K: PrimaryKey> RewriteLog<K> {
    /// Remember `original` unless the key was already rewritten this step.
    pub(crate) fn record(&mut self, key: &K, original: &SortKey) {
        if !self.originals.contains_key(key) {
            self.originals.insert(key.clone(), original.clone());
        }
    }

    /// Take every recorded key, leaving the log empty.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (K, SortKey)> + '_ {
        self.originals.drain()
    }

    pub(crate) fn clear(&mut self) {
        self.originals.clear();
    }
}
