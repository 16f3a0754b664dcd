//! Comparison keys.
//!
//! A [`SortKeyBuilder`] resolves a [`SortSpec`] against the column layout
//! once, then materializes comparison keys for committed rows (from the row
//! source) or for hypothetical rows (from an explicit value row).

use flatview_scalar::{Interner, Scalar};
use smallvec::SmallVec;

use crate::{
    error::{TraversalError, TraversalResult},
    source::{ColumnResolver, RowSource},
    spec::SortSpec,
};

/// Comparison-key tuple: one interned value per sort column, in spec order.
pub type SortKey = SmallVec<[Scalar; 4]>;

/// One row of the position index.
#[derive(Clone, Debug, PartialEq)]
pub struct RowEntry<K> {
    pub key: K,
    pub sort_key: SortKey,
    /// Logically deleted; purged by the next step commit.
    pub deleted: bool,
}

impl<K> RowEntry<K> {
    #[must_use]
    pub const fn new(key: K, sort_key: SortKey) -> Self {
        Self {
            key,
            sort_key,
            deleted: false,
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedColumn {
    /// Displayed column index from the spec.
    column: usize,
    /// Column the values are read from, after redirection.
    sort_by: String,
}

/// Builds comparison keys for one sort specification.
#[derive(Clone, Debug, Default)]
pub struct SortKeyBuilder {
    columns: SmallVec<[ResolvedColumn; 4]>,
}

impl SortKeyBuilder {
    /// Resolve every spec entry to the column its values are read from.
    ///
    /// An entry's own redirect wins over the resolver's redirection.
    pub fn resolve<R>(spec: &SortSpec, resolver: &R) -> TraversalResult<Self>
    where
        R: ColumnResolver + ?Sized,
    {
        let columns = spec
            .iter()
            .map(|entry| -> TraversalResult<ResolvedColumn> {
                let name = resolver
                    .column_name_at(entry.column)
                    .ok_or(TraversalError::UnknownColumn(entry.column))?;
                let sort_by = entry
                    .redirect
                    .clone()
                    .unwrap_or_else(|| resolver.resolve_sort_redirect(name));
                Ok(ResolvedColumn {
                    column: entry.column,
                    sort_by,
                })
            })
            .collect::<TraversalResult<SmallVec<_>>>()?;

        Ok(Self { columns })
    }

    /// Number of key columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(displayed column, sort-by column name)` pairs in key order.
    pub fn columns(&self) -> impl Iterator<Item = (usize, &str)> {
        self.columns
            .iter()
            .map(|resolved| (resolved.column, resolved.sort_by.as_str()))
    }

    /// Build the comparison key for a stored row.
    pub fn build_key<K, S>(&self, source: &S, interner: &mut Interner, key: &K) -> SortKey
    where
        S: RowSource<K> + ?Sized,
    {
        self.columns
            .iter()
            .map(|resolved| interner.intern(source.get(key, &resolved.sort_by)))
            .collect()
    }

    /// Build the comparison key for a row given as explicit values.
    ///
    /// `values` follows the resolver's value-row layout
    /// ([`ColumnResolver::column_index_of`]). Nothing is read from the store.
    pub fn build_key_from_values<R>(
        &self,
        resolver: &R,
        interner: &Interner,
        values: &[Scalar],
    ) -> TraversalResult<SortKey>
    where
        R: ColumnResolver + ?Sized,
    {
        self.columns
            .iter()
            .map(|resolved| -> TraversalResult<Scalar> {
                let index = resolver
                    .column_index_of(&resolved.sort_by)
                    .ok_or_else(|| TraversalError::UnresolvedColumn(resolved.sort_by.clone()))?;
                let value = values
                    .get(index)
                    .ok_or_else(|| TraversalError::ValueRowTooShort {
                        column: resolved.sort_by.clone(),
                        index,
                        len: values.len(),
                    })?;
                Ok(interner.lookup(value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory::MemoryTable, spec::SortEntry};

    fn table() -> MemoryTable<u32> {
        let mut table = MemoryTable::new(["name", "price", "price_raw"]);
        table.insert_row(1, [Scalar::from("widget"), Scalar::from("$5"), Scalar::Int(500)]);
        table.set_sort_redirect("price", "price_raw");
        table
    }

    #[test]
    fn test_build_key_follows_spec_order_and_redirect() {
        let table = table();
        let spec = SortSpec::new(vec![SortEntry::descending(1), SortEntry::ascending(0)]);
        let builder = SortKeyBuilder::resolve(&spec, &table).unwrap();
        let mut interner = Interner::new();

        let key = builder.build_key(&table, &mut interner, &1);

        assert_eq!(key.as_slice(), &[Scalar::Int(500), Scalar::from("widget")]);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_entry_redirect_overrides_resolver() {
        let table = table();
        let spec = SortSpec::new(vec![SortEntry::ascending(1).redirect_to("name")]);
        let builder = SortKeyBuilder::resolve(&spec, &table).unwrap();

        assert_eq!(builder.columns().collect::<Vec<_>>(), vec![(1, "name")]);
    }

    #[test]
    fn test_missing_row_yields_null_key() {
        let table = table();
        let spec = SortSpec::new(vec![SortEntry::ascending(0)]);
        let builder = SortKeyBuilder::resolve(&spec, &table).unwrap();

        let key = builder.build_key(&table, &mut Interner::new(), &99);
        assert_eq!(key.as_slice(), &[Scalar::Null]);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let spec = SortSpec::new(vec![SortEntry::ascending(7)]);

        let err = SortKeyBuilder::resolve(&spec, &table()).unwrap_err();
        assert_eq!(err, TraversalError::UnknownColumn(7));
    }

    #[test]
    fn test_build_key_from_values() {
        let table = table();
        let spec = SortSpec::new(vec![SortEntry::ascending(1)]);
        let builder = SortKeyBuilder::resolve(&spec, &table).unwrap();
        let interner = Interner::new();

        let key = builder
            .build_key_from_values(&table, &interner, &[Scalar::Null, Scalar::Null, Scalar::Int(42)])
            .unwrap();
        assert_eq!(key.as_slice(), &[Scalar::Int(42)]);

        let err = builder
            .build_key_from_values(&table, &interner, &[Scalar::Null])
            .unwrap_err();
        assert_eq!(
            err,
            TraversalError::ValueRowTooShort {
                column: "price_raw".to_string(),
                index: 2,
                len: 1,
            }
        );
    }
}
