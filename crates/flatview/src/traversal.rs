//! Flat traversal - the sorted position index of a live table view.
//!
//! The traversal holds one [`RowEntry`] per active row, ordered by the active
//! [`SortSpec`], plus the inverse map from primary key to position.
//!
//! Mutations are batched in steps:
//!
//! ```text
//! step_begin ──► add_row / update_row / delete_row ... ──► step_end
//!                  (staged, committed index untouched)      (copy-forward,
//!                                                            merge, resort,
//!                                                            reindex)
//! ```
//!
//! Readers keep seeing the last committed order while a step is open, with
//! two exceptions: `update_row` rewrites a committed row's comparison key in
//! place immediately, and rows deleted in the step stay visible (and still
//! counted by `size`) until the commit purges them. Aborting the step puts
//! the rewritten keys back, so the index is sorted whenever no step is open.

use std::time::Instant;

use flatview_scalar::Interner;
use hashbrown::HashMap;
use rayon::slice::ParallelSliceMut;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use crate::{
    compare::MultiSorter,
    config::TraversalConfig,
    error::{TraversalError, TraversalResult},
    fatal,
    key::{RowEntry, SortKeyBuilder},
    source::{ColumnResolver, PrimaryKey, RowSource},
    spec::SortSpec,
    step::{PendingRows, RewriteLog, StepPhase, StepStats},
};

/// Primary key to position map.
pub type PositionMap<K> = HashMap<K, usize, FxBuildHasher>;

/// Sorted position index with batched step commits.
///
/// Single writer: callers serialize access to one instance.
pub struct FlatTraversal<K> {
    pub(crate) config: TraversalConfig,
    pub(crate) spec: SortSpec,
    pub(crate) builder: SortKeyBuilder,
    pub(crate) sorter: MultiSorter,
    pub(crate) interner: Interner,
    /// Rows in position order.
    pub(crate) index: Vec<RowEntry<K>>,
    /// Inverse of `index`.
    pub(crate) positions: PositionMap<K>,
    phase: StepPhase,
    pending: PendingRows<K>,
    rewrites: RewriteLog<K>,
    stats: StepStats,
}

impl<K: PrimaryKey> Default for FlatTraversal<K> {
    fn default() -> Self {
        Self::new(TraversalConfig::default())
    }
}

impl<K: PrimaryKey> FlatTraversal<K> {
    /// Create an empty, unsorted traversal.
    #[must_use]
    pub fn new(config: TraversalConfig) -> Self {
        let sorter = MultiSorter::new(&SortSpec::unsorted(), config.nan_policy);
        Self {
            config,
            spec: SortSpec::unsorted(),
            builder: SortKeyBuilder::default(),
            sorter,
            interner: Interner::new(),
            index: Vec::new(),
            positions: PositionMap::default(),
            phase: StepPhase::Idle,
            pending: PendingRows::default(),
            rewrites: RewriteLog::default(),
            stats: StepStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Number of rows in the index.
    #[must_use]
    pub fn size(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The active sort specification.
    #[must_use]
    pub fn sort_spec(&self) -> &SortSpec {
        &self.spec
    }

    /// Check if the view is unsorted (rows stay in arrival order).
    #[must_use]
    pub fn is_unsorted(&self) -> bool {
        self.spec.is_empty()
    }

    #[must_use]
    pub fn is_step_open(&self) -> bool {
        self.phase == StepPhase::Open
    }

    /// Counters of the open step, or of the last step if none is open.
    #[must_use]
    pub fn step_stats(&self) -> StepStats {
        self.stats
    }

    /// Number of rows staged in the open step.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every row and any open step. The sort specification is kept.
    pub fn reset(&mut self) {
        self.index.clear();
        self.positions.clear();
        self.pending.clear();
        self.rewrites.clear();
        self.interner.clear();
        self.stats = StepStats::default();
        self.phase = StepPhase::Idle;
    }

    // ==================== Full Resort ====================

    /// Replace the sort specification and resort every row.
    ///
    /// An empty `spec` is a no-op: the current order and specification are
    /// kept. Otherwise every comparison key is rebuilt from `source`.
    pub fn sort_by<S, R>(&mut self, source: &S, resolver: &R, spec: SortSpec) -> TraversalResult<()>
    where
        S: RowSource<K> + ?Sized,
        R: ColumnResolver + ?Sized,
    {
        if self.phase == StepPhase::Open {
            return Err(TraversalError::StepAlreadyOpen);
        }
        if spec.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let builder = SortKeyBuilder::resolve(&spec, resolver)?;
        // Every key is rebuilt, so a fresh interner only keeps live strings.
        let mut interner = Interner::new();

        let mut rows: Vec<RowEntry<K>> = std::mem::take(&mut self.index)
            .into_iter()
            .filter(|entry| !entry.deleted)
            .map(|entry| {
                let sort_key = builder.build_key(source, &mut interner, &entry.key);
                RowEntry::new(entry.key, sort_key)
            })
            .collect();

        let sorter = MultiSorter::new(&spec, self.config.nan_policy);
        sort_rows(&mut rows, &sorter, &self.config);

        self.index = rows;
        self.spec = spec;
        self.builder = builder;
        self.sorter = sorter;
        self.interner = interner;
        self.rebuild_positions();

        debug!(
            rows = self.index.len(),
            columns = self.builder.len(),
            elapsed = ?start.elapsed(),
            "resorted flat traversal"
        );
        Ok(())
    }

    // ==================== Step Transactions ====================

    /// Open a step: zero the counters and clear staged rows.
    pub fn step_begin(&mut self) -> TraversalResult<()> {
        if self.phase == StepPhase::Open {
            return Err(TraversalError::StepAlreadyOpen);
        }
        self.stats = StepStats::default();
        self.pending.clear();
        self.rewrites.clear();
        self.phase = StepPhase::Open;
        Ok(())
    }

    /// Stage a row using the store's current values.
    ///
    /// Restaging a key replaces its staged row; the insert counter still
    /// counts every call.
    pub fn add_row<S>(&mut self, source: &S, key: K) -> TraversalResult<()>
    where
        S: RowSource<K> + ?Sized,
    {
        self.ensure_open()?;
        self.stage(source, key);
        Ok(())
    }

    /// Refresh a row after its values changed.
    ///
    /// No-op while unsorted. A key that is not active is staged like
    /// [`add_row`](Self::add_row). An active row has its comparison key
    /// rewritten in place right away; its position is fixed at commit.
    pub fn update_row<S>(&mut self, source: &S, key: K) -> TraversalResult<()>
    where
        S: RowSource<K> + ?Sized,
    {
        self.ensure_open()?;
        if self.spec.is_empty() {
            return Ok(());
        }

        let Some(position) = self.active_position(&key) else {
            self.stage(source, key);
            return Ok(());
        };

        let sort_key = self.builder.build_key(source, &mut self.interner, &key);
        if self.pending.contains(&key) {
            // A staged copy would overwrite the row at commit; keep it current.
            self.pending.stage(RowEntry::new(key.clone(), sort_key.clone()));
        }
        trace!(?key, position, "updated row in place");
        self.rewrites.record(&key, &self.index[position].sort_key);
        self.index[position].sort_key = sort_key;
        Ok(())
    }

    /// Remove a row at the next commit.
    ///
    /// Cancels a row staged for the same key in this step. No-op if the key
    /// is neither staged nor active.
    pub fn delete_row(&mut self, key: &K) -> TraversalResult<()> {
        self.ensure_open()?;

        let cancelled = self.pending.cancel(key);
        let marked = match self.active_position(key) {
            Some(position) => {
                self.index[position].deleted = true;
                true
            }
            None => false,
        };

        if cancelled || marked {
            self.stats.deletes += 1;
            trace!(?key, cancelled, marked, "deleted row");
        }
        Ok(())
    }

    /// Commit the open step.
    ///
    /// Surviving rows are copied forward, staged rows replace their committed
    /// copy or are appended, then the result is resorted (unless unsorted)
    /// and the inverse map is rebuilt. The outcome does not depend on the
    /// order operations on distinct keys were issued in.
    pub fn step_end(&mut self) -> TraversalResult<()> {
        self.ensure_open()?;
        let start = Instant::now();

        let expected = (self.index.len() + self.stats.inserts).saturating_sub(self.stats.deletes);
        let mut merged: Vec<RowEntry<K>> = Vec::with_capacity(expected);
        let mut present: PositionMap<K> =
            HashMap::with_capacity_and_hasher(self.index.len(), FxBuildHasher);

        for entry in std::mem::take(&mut self.index) {
            if !entry.deleted {
                present.insert(entry.key.clone(), merged.len());
                merged.push(entry);
            }
        }

        let mut appended = 0_usize;
        for staged in self.pending.drain() {
            if let Some(&slot) = present.get(&staged.key) {
                merged[slot] = staged;
            } else {
                merged.push(staged);
                appended += 1;
            }
        }

        if !self.spec.is_empty() {
            sort_rows(&mut merged, &self.sorter, &self.config);
        }

        self.index = merged;
        self.rebuild_positions();
        self.rewrites.clear();
        let released = self.interner.purge_unshared();
        self.phase = StepPhase::Idle;

        debug!(
            rows = self.index.len(),
            appended,
            inserts = self.stats.inserts,
            deletes = self.stats.deletes,
            released,
            elapsed = ?start.elapsed(),
            "committed step"
        );
        Ok(())
    }

    /// Abandon the open step.
    ///
    /// Staged rows and pending deletes are dropped, and comparison keys
    /// rewritten by `update_row` get their committed values back. Positions
    /// never moved during the step, so the index is in order again.
    pub fn step_abort(&mut self) -> TraversalResult<()> {
        self.ensure_open()?;
        self.pending.clear();
        for entry in &mut self.index {
            entry.deleted = false;
        }
        for (key, original) in self.rewrites.drain() {
            if let Some(&position) = self.positions.get(&key) {
                self.index[position].sort_key = original;
            }
        }
        self.interner.purge_unshared();
        self.stats = StepStats::default();
        self.phase = StepPhase::Idle;
        debug!(rows = self.index.len(), "aborted step");
        Ok(())
    }

    // ==================== Internals ====================

    fn ensure_open(&self) -> TraversalResult<()> {
        match self.phase {
            StepPhase::Open => Ok(()),
            StepPhase::Idle => Err(TraversalError::NoOpenStep),
        }
    }

    /// Position of a committed row that is not marked deleted.
    fn active_position(&self, key: &K) -> Option<usize> {
        self.positions
            .get(key)
            .copied()
            .filter(|&position| !self.index[position].deleted)
    }

    fn stage<S>(&mut self, source: &S, key: K)
    where
        S: RowSource<K> + ?Sized,
    {
        let sort_key = self.builder.build_key(source, &mut self.interner, &key);
        trace!(?key, "staged row");
        self.pending.stage(RowEntry::new(key, sort_key));
        self.stats.inserts += 1;
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        self.positions.reserve(self.index.len());
        for (position, entry) in self.index.iter().enumerate() {
            if let Some(previous) = self.positions.insert(entry.key.clone(), position) {
                fatal::corruption(format_args!(
                    "primary key {:?} at positions {previous} and {position}",
                    entry.key
                ));
            }
        }
    }
}

/// Sort rows with the comparator, in parallel for large inputs.
///
/// The comparator is total over distinct keys, so both paths agree.
fn sort_rows<K: PrimaryKey>(rows: &mut [RowEntry<K>], sorter: &MultiSorter, config: &TraversalConfig) {
    if config.use_parallel_sort(rows.len()) {
        rows.par_sort_unstable_by(|a, b| sorter.cmp_entries(a, b));
    } else {
        rows.sort_unstable_by(|a, b| sorter.cmp_entries(a, b));
    }
}

impl<K: PrimaryKey> std::fmt::Debug for FlatTraversal<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatTraversal")
            .field("rows", &self.index.len())
            .field("spec", &self.spec)
            .field("phase", &self.phase)
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish()
    }
}
