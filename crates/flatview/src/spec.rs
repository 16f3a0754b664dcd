//! Sort specifications.
//!
//! A [`SortSpec`] is an ordered list of [`SortEntry`] values. The first
//! entry is the primary sort column, later entries break ties. Replacing the
//! active spec invalidates every cached comparison key, so it always costs a
//! full resort.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Direction of one sort column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
    /// Ascending by numeric magnitude.
    AscendingAbs,
    /// Descending by numeric magnitude.
    DescendingAbs,
    /// Column is carried in the key but never decides the order.
    Ignore,
}

impl SortDirection {
    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Descending | Self::DescendingAbs)
    }

    #[must_use]
    pub const fn is_abs(self) -> bool {
        matches!(self, Self::AscendingAbs | Self::DescendingAbs)
    }
}

/// One column of a sort specification.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortEntry {
    /// Index of the displayed column, as understood by the column resolver.
    pub column: usize,
    pub direction: SortDirection,
    /// Sort by this column's values instead of the displayed column's.
    ///
    /// Takes precedence over the resolver's own sort-by redirection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl SortEntry {
    #[must_use]
    pub const fn new(column: usize, direction: SortDirection) -> Self {
        Self {
            column,
            direction,
            redirect: None,
        }
    }

    #[must_use]
    pub const fn ascending(column: usize) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    #[must_use]
    pub const fn descending(column: usize) -> Self {
        Self::new(column, SortDirection::Descending)
    }

    /// Sort this column by the values of another column.
    #[must_use]
    pub fn redirect_to(mut self, column: impl Into<String>) -> Self {
        self.redirect = Some(column.into());
        self
    }
}

/// Ordered multi-column sort specification.
///
/// An empty spec means "unsorted": rows keep their arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    entries: Vec<SortEntry>,
}

impl SortSpec {
    #[must_use]
    pub const fn new(entries: Vec<SortEntry>) -> Self {
        Self { entries }
    }

    /// The empty specification.
    #[must_use]
    pub const fn unsorted() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[SortEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortEntry> {
        self.entries.iter()
    }

    /// Directions in specification order.
    #[must_use]
    pub fn directions(&self) -> SmallVec<[SortDirection; 4]> {
        self.entries.iter().map(|entry| entry.direction).collect()
    }
}

impl From<Vec<SortEntry>> for SortSpec {
    fn from(entries: Vec<SortEntry>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<SortEntry> for SortSpec {
    fn from_iter<I: IntoIterator<Item = SortEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SortSpec {
    type Item = &'a SortEntry;
    type IntoIter = std::slice::Iter<'a, SortEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
