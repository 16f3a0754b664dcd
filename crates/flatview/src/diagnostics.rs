//! Consistency checks for the position index.

use std::cmp::Ordering;

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::{error::InvariantViolation, fatal, source::PrimaryKey, traversal::FlatTraversal};

impl<K: PrimaryKey> FlatTraversal<K> {
    /// First primary key that occurs twice in the index, if any.
    #[must_use]
    pub fn find_duplicate_key(&self) -> Option<K> {
        let mut seen: HashSet<&K, FxBuildHasher> =
            HashSet::with_capacity_and_hasher(self.index.len(), FxBuildHasher);
        self.index
            .iter()
            .find(|entry| !seen.insert(&entry.key))
            .map(|entry| entry.key.clone())
    }

    /// Abort the process if any primary key occurs twice.
    pub fn check_no_duplicate_keys(&self) {
        if let Some(key) = self.find_duplicate_key() {
            fatal::corruption(format_args!("duplicate primary key {key:?}"));
        }
    }

    /// Verify order, inverse map and deletion state of the committed index.
    ///
    /// Meaningful between steps: an open step may hold delete marks and
    /// in-place key rewrites that the next commit resolves.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.positions.len() != self.index.len() {
            return Err(InvariantViolation::SizeMismatch {
                map: self.positions.len(),
                index: self.index.len(),
            });
        }

        for (position, entry) in self.index.iter().enumerate() {
            if entry.deleted {
                return Err(InvariantViolation::DeletedRow { position });
            }
            if self.positions.get(&entry.key) != Some(&position) {
                return Err(InvariantViolation::MisplacedKey { position });
            }
        }

        if !self.spec.is_empty() {
            if let Some(position) = self
                .index
                .windows(2)
                .position(|pair| self.sorter.cmp_entries(&pair[0], &pair[1]) != Ordering::Less)
            {
                return Err(InvariantViolation::OutOfOrder { position });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::RowEntry,
        memory::MemoryTable,
        spec::{SortEntry, SortSpec},
    };

    fn view() -> (MemoryTable<u32>, FlatTraversal<u32>) {
        let mut table = MemoryTable::new(["v"]);
        for key in 0..5_u32 {
            table.insert_row(key, [i64::from(4 - key)]);
        }
        let mut trav = FlatTraversal::default();
        trav.sort_by(&table, &table, SortSpec::new(vec![SortEntry::ascending(0)]))
            .unwrap();
        trav.step_begin().unwrap();
        for key in 0..5 {
            trav.add_row(&table, key).unwrap();
        }
        trav.step_end().unwrap();
        (table, trav)
    }

    #[test]
    fn test_committed_index_is_consistent() {
        let (_, trav) = view();

        assert_eq!(trav.check_invariants(), Ok(()));
        assert_eq!(trav.find_duplicate_key(), None);
        trav.check_no_duplicate_keys();
    }

    #[test]
    fn test_detects_out_of_order() {
        let (_, mut trav) = view();
        trav.index.swap(1, 2);
        trav.positions.insert(trav.index[1].key, 1);
        trav.positions.insert(trav.index[2].key, 2);

        assert_eq!(
            trav.check_invariants(),
            Err(InvariantViolation::OutOfOrder { position: 1 })
        );
    }

    #[test]
    fn test_detects_map_drift() {
        let (_, mut trav) = view();
        trav.positions.insert(trav.index[0].key, 3);

        assert_eq!(
            trav.check_invariants(),
            Err(InvariantViolation::MisplacedKey { position: 0 })
        );

        trav.positions.insert(99, 0);
        assert_eq!(
            trav.check_invariants(),
            Err(InvariantViolation::SizeMismatch { map: 6, index: 5 })
        );
    }

    #[test]
    fn test_detects_leftover_delete_mark() {
        let (_, mut trav) = view();
        trav.index[4].deleted = true;

        assert_eq!(
            trav.check_invariants(),
            Err(InvariantViolation::DeletedRow { position: 4 })
        );
    }

    #[test]
    fn test_duplicate_key_check_aborts() {
        if crate::fatal::is_abort_child() {
            let (_, mut trav) = view();
            let copy = trav.index[3].clone();
            trav.index.push(copy);
            trav.check_no_duplicate_keys();
            return;
        }

        let output =
            crate::fatal::run_abort_child("diagnostics::tests::test_duplicate_key_check_aborts");
        let stderr = String::from_utf8_lossy(&output.stderr);

        assert!(!output.status.success());
        assert!(stderr.contains("duplicate primary key"), "{stderr}");
    }

    #[test]
    fn test_find_duplicate_key() {
        let (_, mut trav) = view();
        let copy = trav.index[3].clone();
        trav.index.push(RowEntry::new(copy.key, copy.sort_key));

        assert_eq!(trav.find_duplicate_key(), Some(trav.index[3].key));
    }
}
