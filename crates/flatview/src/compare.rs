//! Multi-column row comparator.
//!
//! Per column, values fall into three placement classes: missing (`Null`),
//! present, and NaN. Under an ascending direction missing values come first,
//! then present values in canonical [`Scalar`] order, then NaN (with
//! [`NanPolicy::Greatest`]). [`NanPolicy::AsMissing`] moves NaN into the
//! missing class instead. Descending directions reverse the whole column
//! order, placement classes included.
//!
//! Every column comparison is a total preorder, so the lexicographic
//! combination is one too and is safe to hand to any sort routine.

use std::cmp::Ordering;

use flatview_scalar::{Scalar, total_cmp_f64};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    key::RowEntry,
    spec::{SortDirection, SortSpec},
};

/// Placement of NaN values within a sort column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// NaN sorts above every other value.
    #[default]
    Greatest,
    /// NaN is left out of value comparisons and placed with missing values.
    AsMissing,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Placement {
    Missing,
    Present,
    Nan,
}

fn placement(value: &Scalar, nan_policy: NanPolicy) -> Placement {
    if value.is_null() {
        Placement::Missing
    } else if value.is_nan() {
        match nan_policy {
            NanPolicy::Greatest => Placement::Nan,
            NanPolicy::AsMissing => Placement::Missing,
        }
    } else {
        Placement::Present
    }
}

/// Compare two present values by magnitude.
///
/// Values of different variants, or non-numeric values, fall back to the
/// canonical order.
fn cmp_magnitude(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Int(x), Scalar::Int(y)) => x.unsigned_abs().cmp(&y.unsigned_abs()),
        (Scalar::Float(x), Scalar::Float(y)) => total_cmp_f64(x.abs(), y.abs()),
        _ => a.cmp(b),
    }
}

/// Compare two values of one sort column.
#[must_use]
pub fn compare_values(
    a: &Scalar,
    b: &Scalar,
    direction: SortDirection,
    nan_policy: NanPolicy,
) -> Ordering {
    if direction == SortDirection::Ignore {
        return Ordering::Equal;
    }

    let (pa, pb) = (placement(a, nan_policy), placement(b, nan_policy));
    let ordering = if pa != pb {
        pa.cmp(&pb)
    } else if pa != Placement::Present {
        Ordering::Equal
    } else if direction.is_abs() {
        cmp_magnitude(a, b)
    } else {
        a.cmp(b)
    };

    if direction.is_descending() {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Comparator bound to the directions of one sort specification.
#[derive(Clone, Debug, Default)]
pub struct MultiSorter {
    directions: SmallVec<[SortDirection; 4]>,
    nan_policy: NanPolicy,
}

impl MultiSorter {
    #[must_use]
    pub fn new(spec: &SortSpec, nan_policy: NanPolicy) -> Self {
        Self {
            directions: spec.directions(),
            nan_policy,
        }
    }

    /// Compare comparison-key tuples column by column.
    ///
    /// The first non-equal column decides; `Equal` means the keys tie.
    #[must_use]
    pub fn cmp_keys(&self, a: &[Scalar], b: &[Scalar]) -> Ordering {
        debug_assert_eq!(a.len(), b.len(), "comparison keys built from different specs");

        for ((x, y), &direction) in a.iter().zip(b).zip(&self.directions) {
            let ordering = compare_values(x, y, direction, self.nan_policy);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Compare two rows, breaking key ties by ascending primary key.
    ///
    /// This is a strict total order over rows with distinct primary keys, so
    /// sorted output is identical for any sort algorithm and input order.
    #[must_use]
    pub fn cmp_entries<K: Ord>(&self, a: &RowEntry<K>, b: &RowEntry<K>) -> Ordering {
        self.cmp_keys(&a.sort_key, &b.sort_key)
            .then_with(|| a.key.cmp(&b.key))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use smallvec::smallvec;

    use super::*;
    use crate::spec::SortEntry;

    const ASC: SortDirection = SortDirection::Ascending;
    const DESC: SortDirection = SortDirection::Descending;

    fn entry(key: u32, values: &[Scalar]) -> RowEntry<u32> {
        RowEntry::new(key, values.iter().cloned().collect())
    }

    #[test]
    fn test_missing_first_nan_last_ascending() {
        let nan = Scalar::Float(f64::NAN);
        let one = Scalar::Float(1.0);
        let null = Scalar::Null;

        assert_eq!(compare_values(&null, &one, ASC, NanPolicy::Greatest), Ordering::Less);
        assert_eq!(compare_values(&one, &nan, ASC, NanPolicy::Greatest), Ordering::Less);
        assert_eq!(compare_values(&null, &nan, ASC, NanPolicy::Greatest), Ordering::Less);
        assert_eq!(compare_values(&nan, &nan, ASC, NanPolicy::Greatest), Ordering::Equal);
    }

    #[test]
    fn test_descending_reverses_placement() {
        let nan = Scalar::Float(f64::NAN);
        let one = Scalar::Float(1.0);

        assert_eq!(compare_values(&nan, &one, DESC, NanPolicy::Greatest), Ordering::Less);
        assert_eq!(
            compare_values(&Scalar::Null, &one, DESC, NanPolicy::Greatest),
            Ordering::Greater
        );
    }

    #[test]
    fn test_nan_as_missing() {
        let nan = Scalar::Float(f64::NAN);

        assert_eq!(
            compare_values(&nan, &Scalar::Null, ASC, NanPolicy::AsMissing),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(&nan, &Scalar::Float(-1e9), ASC, NanPolicy::AsMissing),
            Ordering::Less
        );
    }

    #[test]
    fn test_abs_directions() {
        let abs = SortDirection::AscendingAbs;
        let neg = Scalar::Int(-10);
        let pos = Scalar::Int(3);

        assert_eq!(compare_values(&pos, &neg, abs, NanPolicy::Greatest), Ordering::Less);
        assert_eq!(
            compare_values(&pos, &neg, SortDirection::DescendingAbs, NanPolicy::Greatest),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Scalar::Int(i64::MIN), &Scalar::Int(i64::MAX), abs, NanPolicy::Greatest),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Scalar::Float(-2.5), &Scalar::Float(2.5), abs, NanPolicy::Greatest),
            Ordering::Equal
        );
        // Non-numeric values keep their canonical order.
        assert_eq!(
            compare_values(&Scalar::from("a"), &Scalar::from("b"), abs, NanPolicy::Greatest),
            Ordering::Less
        );
    }

    #[test]
    fn test_ignore_direction_never_decides() {
        let sorter = MultiSorter::new(
            &SortSpec::new(vec![
                SortEntry::new(0, SortDirection::Ignore),
                SortEntry::ascending(1),
            ]),
            NanPolicy::Greatest,
        );

        let a = [Scalar::Int(100), Scalar::Int(1)];
        let b = [Scalar::Int(-100), Scalar::Int(2)];
        assert_eq!(sorter.cmp_keys(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_first_non_equal_column_decides() {
        let sorter = MultiSorter::new(
            &SortSpec::new(vec![SortEntry::ascending(0), SortEntry::descending(1)]),
            NanPolicy::Greatest,
        );

        let a = entry(1, &[Scalar::from("x"), Scalar::Int(1)]);
        let b = entry(2, &[Scalar::from("x"), Scalar::Int(5)]);
        let c = entry(3, &[Scalar::from("y"), Scalar::Int(9)]);

        assert_eq!(sorter.cmp_entries(&b, &a), Ordering::Less);
        assert_eq!(sorter.cmp_entries(&a, &c), Ordering::Less);
    }

    #[test]
    fn test_tie_broken_by_primary_key() {
        let sorter = MultiSorter::new(
            &SortSpec::new(vec![SortEntry::ascending(0)]),
            NanPolicy::Greatest,
        );

        let a = entry(7, &[Scalar::Int(1)]);
        let b = entry(3, &[Scalar::Int(1)]);

        assert_eq!(sorter.cmp_keys(&a.sort_key, &b.sort_key), Ordering::Equal);
        assert_eq!(sorter.cmp_entries(&b, &a), Ordering::Less);
    }

    fn arb_value() -> impl Strategy<Value = Scalar> {
        prop_oneof![
            Just(Scalar::Null),
            Just(Scalar::Float(f64::NAN)),
            (-5.0_f64..5.0).prop_map(Scalar::Float),
            (-5_i64..5).prop_map(Scalar::Int),
            "[xy]{0,2}".prop_map(Scalar::from),
        ]
    }

    fn arb_direction() -> impl Strategy<Value = SortDirection> {
        prop_oneof![
            Just(SortDirection::Ascending),
            Just(SortDirection::Descending),
            Just(SortDirection::AscendingAbs),
            Just(SortDirection::DescendingAbs),
            Just(SortDirection::Ignore),
        ]
    }

    fn arb_policy() -> impl Strategy<Value = NanPolicy> {
        prop_oneof![Just(NanPolicy::Greatest), Just(NanPolicy::AsMissing)]
    }

    proptest! {
        #[test]
        fn prop_column_order_is_strict_weak(
            a in arb_value(),
            b in arb_value(),
            c in arb_value(),
            direction in arb_direction(),
            policy in arb_policy(),
        ) {
            let cmp = |x: &Scalar, y: &Scalar| compare_values(x, y, direction, policy);

            prop_assert_eq!(cmp(&a, &a), Ordering::Equal);
            prop_assert_eq!(cmp(&a, &b), cmp(&b, &a).reverse());
            if cmp(&a, &b) != Ordering::Greater && cmp(&b, &c) != Ordering::Greater {
                prop_assert_ne!(cmp(&a, &c), Ordering::Greater);
            }
            if cmp(&a, &b) == Ordering::Equal && cmp(&b, &c) == Ordering::Equal {
                prop_assert_eq!(cmp(&a, &c), Ordering::Equal);
            }
        }

        #[test]
        fn prop_entries_sort_identically_from_any_input_order(
            values in prop::collection::vec((arb_value(), arb_value()), 1..24),
            policy in arb_policy(),
        ) {
            let sorter = MultiSorter::new(
                &SortSpec::new(vec![SortEntry::ascending(0), SortEntry::descending(1)]),
                policy,
            );
            let rows: Vec<RowEntry<usize>> = values
                .into_iter()
                .enumerate()
                .map(|(key, (x, y))| RowEntry::new(key, smallvec![x, y]))
                .collect();

            let mut forward = rows.clone();
            forward.sort_by(|a, b| sorter.cmp_entries(a, b));
            let mut backward: Vec<_> = rows.into_iter().rev().collect();
            backward.sort_unstable_by(|a, b| sorter.cmp_entries(a, b));

            let forward_keys: Vec<usize> = forward.iter().map(|row| row.key).collect();
            let backward_keys: Vec<usize> = backward.iter().map(|row| row.key).collect();
            prop_assert_eq!(forward_keys, backward_keys);
        }
    }
}
