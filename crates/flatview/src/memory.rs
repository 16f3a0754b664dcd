//! In-memory row source.
//!
//! [`MemoryTable`] implements both [`RowSource`] and [`ColumnResolver`] over
//! plain hash maps. Hosts with a real columnar store implement the traits on
//! their own types; this one backs tests, benchmarks and small embeddings.

use flatview_scalar::Scalar;
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::source::{ColumnResolver, PrimaryKey, RowSource};

/// Rows keyed by primary key, one value per column.
#[derive(Clone, Debug)]
pub struct MemoryTable<K> {
    columns: Vec<String>,
    column_indices: HashMap<String, usize, FxBuildHasher>,
    redirects: HashMap<String, String, FxBuildHasher>,
    rows: HashMap<K, Vec<Scalar>, FxBuildHasher>,
}

impl<K: PrimaryKey> MemoryTable<K> {
    /// Create an empty table with the given columns.
    ///
    /// Column order is both the displayed order and the value-row layout.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let column_indices = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Self {
            columns,
            column_indices,
            redirects: HashMap::default(),
            rows: HashMap::default(),
        }
    }

    /// Insert or replace a row.
    ///
    /// Missing trailing values are filled with `Null`; extra values are
    /// dropped.
    pub fn insert_row<I, V>(&mut self, key: K, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let mut row: Vec<Scalar> = values
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), Scalar::Null);
        self.rows.insert(key, row);
    }

    /// Set one cell. Returns `false` if the row or column does not exist.
    pub fn set(&mut self, key: &K, column: &str, value: impl Into<Scalar>) -> bool {
        let Some(&idx) = self.column_indices.get(column) else {
            return false;
        };
        let Some(row) = self.rows.get_mut(key) else {
            return false;
        };
        row[idx] = value.into();
        true
    }

    /// Remove a row, returning its values.
    pub fn remove_row(&mut self, key: &K) -> Option<Vec<Scalar>> {
        self.rows.remove(key)
    }

    /// Values of a row in column order.
    #[must_use]
    pub fn row(&self, key: &K) -> Option<&[Scalar]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Make `column` sort by the values of `sort_by`.
    pub fn set_sort_redirect(&mut self, column: impl Into<String>, sort_by: impl Into<String>) {
        self.redirects.insert(column.into(), sort_by.into());
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<K: PrimaryKey> RowSource<K> for MemoryTable<K> {
    fn get(&self, key: &K, column: &str) -> Scalar {
        self.column_indices
            .get(column)
            .and_then(|&idx| self.rows.get(key).map(|row| row[idx].clone()))
            .unwrap_or_default()
    }
}

impl<K> ColumnResolver for MemoryTable<K> {
    fn column_name_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    fn resolve_sort_redirect(&self, column: &str) -> String {
        self.redirects
            .get(column)
            .cloned()
            .unwrap_or_else(|| column.to_owned())
    }

    fn column_index_of(&self, column: &str) -> Option<usize> {
        self.column_indices.get(column).copied()
    }
}
