//! Read-only queries over the committed order.
//!
//! Positions are 0-based and always refer to the last committed (or resorted)
//! order. Range queries take half-open `[begin, end)` ranges and clamp them to
//! the index.

use std::cmp::Ordering;

use flatview_scalar::Scalar;
use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::{
    error::TraversalResult,
    source::{ColumnResolver, PrimaryKey},
    traversal::{FlatTraversal, PositionMap},
};

/// Address of a displayed cell: row position and column index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<(usize, usize)> for CellRef {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

impl<K: PrimaryKey> FlatTraversal<K> {
    /// Primary key at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.size()`.
    #[must_use]
    pub fn key_at(&self, position: usize) -> &K {
        &self.index[position].key
    }

    /// Primary key at `position`, or `None` past the end.
    #[must_use]
    pub fn get_key(&self, position: usize) -> Option<&K> {
        self.index.get(position).map(|entry| &entry.key)
    }

    /// Every primary key in position order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.index.iter().map(|entry| &entry.key)
    }

    /// Primary keys at positions `[begin, end)`, clamped to the index.
    #[must_use]
    pub fn keys_in_range(&self, begin: usize, end: usize) -> Vec<K> {
        let end = end.min(self.index.len());
        let begin = begin.min(end);
        self.index[begin..end]
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Primary keys of the rows the cells point at.
    ///
    /// Each row is reported once, in ascending position order.
    ///
    /// # Panics
    ///
    /// Panics if a cell points past the end; see
    /// [`validate_positions`](Self::validate_positions).
    #[must_use]
    pub fn keys_for_cells(&self, cells: &[CellRef]) -> Vec<K> {
        let mut rows: Vec<usize> = cells.iter().map(|cell| cell.row).collect();
        rows.sort_unstable();
        rows.dedup();
        rows.into_iter()
            .map(|row| self.key_at(row).clone())
            .collect()
    }

    /// Primary key of each cell's row, one per cell, in input order.
    ///
    /// Repeated rows are repeated in the output.
    ///
    /// # Panics
    ///
    /// Panics if a cell points past the end.
    #[must_use]
    pub fn keys_for_cells_preserving_order(&self, cells: &[CellRef]) -> Vec<K> {
        cells
            .iter()
            .map(|cell| self.key_at(cell.row).clone())
            .collect()
    }

    /// Position of `key`, or `None` if it is not in the index.
    #[must_use]
    pub fn position_of(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Positions of the given keys. Keys not in the index are left out.
    #[must_use]
    pub fn positions_for_keys<'a, I>(&self, keys: I) -> PositionMap<K>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        keys.into_iter()
            .filter_map(|key| {
                self.positions
                    .get(key)
                    .map(|&position| (key.clone(), position))
            })
            .collect()
    }

    /// Positions of the given keys among the rows at `[begin, end)`.
    ///
    /// Keys outside the window, or not in the index, are left out. The range
    /// is clamped to the index.
    #[must_use]
    pub fn positions_for_keys_in<'a, I>(&self, begin: usize, end: usize, keys: I) -> PositionMap<K>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let end = end.min(self.index.len());
        let begin = begin.min(end);
        let wanted: HashSet<&K, FxBuildHasher> = keys.into_iter().collect();
        if wanted.is_empty() {
            return PositionMap::default();
        }

        self.index[begin..end]
            .iter()
            .enumerate()
            .filter(|(_, entry)| wanted.contains(&entry.key))
            .map(|(offset, entry)| (entry.key.clone(), begin + offset))
            .collect()
    }

    /// Check that every cell points at an existing row.
    #[must_use]
    pub fn validate_positions(&self, cells: &[CellRef]) -> bool {
        cells.iter().all(|cell| cell.row < self.index.len())
    }

    /// Position a row with the given values would take if inserted now.
    ///
    /// `values` follows the resolver's value-row layout. The hypothetical row
    /// goes before every existing row that compares equal on the sort
    /// columns. An unsorted view always appends, so this is `size()`.
    pub fn lower_bound_position<R>(&self, resolver: &R, values: &[Scalar]) -> TraversalResult<usize>
    where
        R: ColumnResolver + ?Sized,
    {
        if self.builder.is_empty() {
            return Ok(self.index.len());
        }
        let target = self
            .builder
            .build_key_from_values(resolver, &self.interner, values)?;
        Ok(self
            .index
            .partition_point(|entry| self.sorter.cmp_keys(&entry.sort_key, &target) == Ordering::Less))
    }
}
