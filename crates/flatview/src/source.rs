//! Interfaces to the collaborators that own the data.
//!
//! The traversal never stores cell values of its own. It reads them through
//! a [`RowSource`] and learns the column layout through a [`ColumnResolver`].

use std::{fmt::Debug, hash::Hash};

use flatview_scalar::Scalar;

/// Row identity: stable across reorders, hashable and totally ordered.
pub trait PrimaryKey: Clone + Eq + Hash + Ord + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Ord + Debug + Send + Sync> PrimaryKey for T {}

/// Read-only access to the authoritative cell values.
pub trait RowSource<K> {
    /// Current value of `column` for the row `key`.
    ///
    /// Rows or columns the source does not know yield [`Scalar::Null`].
    fn get(&self, key: &K, column: &str) -> Scalar;
}

/// Column layout of the view being sorted.
pub trait ColumnResolver {
    /// Name of the displayed column at `index`.
    fn column_name_at(&self, index: usize) -> Option<&str>;

    /// Column whose values order `column`.
    ///
    /// Lets a displayed column sort by a different underlying column.
    fn resolve_sort_redirect(&self, column: &str) -> String {
        column.to_owned()
    }

    /// Position of `column` within an explicit value row.
    fn column_index_of(&self, column: &str) -> Option<usize>;
}
