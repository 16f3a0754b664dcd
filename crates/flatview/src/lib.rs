//! Sorted position index for live table views.
//!
//! A [`FlatTraversal`] keeps every row of a view in display order and answers
//! position ⇄ primary-key queries in O(1). Row changes arrive in batched
//! steps; each commit merges the batch and restores the order.
//!
//! - **Multi-column sort**: ascending, descending, by magnitude, or ignored
//! - **Null and NaN placement**: missing values first, NaN last (or missing)
//! - **Sort redirection**: a displayed column can sort by another column
//! - **Hypothetical inserts**: where would a row with these values land?
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  FlatTraversal<K>                                                   │
//! │    - index: Vec<RowEntry>       position → (pk, sort key)           │
//! │    - positions: HashMap         pk → position                       │
//! │    - pending: PendingRows       rows staged by the open step        │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │ step_end / sort_by                      ▲ add/update_row
//!          ▼                                         │
//! ┌──────────────────────────────┐   ┌──────────────────────────────────┐
//! │  MultiSorter                 │   │  SortKeyBuilder                  │
//! │    - per-column direction    │   │    - spec entry → sort-by column │
//! │    - NaN policy, pk tiebreak │   │    - reads RowSource, interns    │
//! └──────────────────────────────┘   └──────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use flatview::{FlatTraversal, MemoryTable, SortEntry, SortSpec};
//!
//! let mut table = MemoryTable::new(["name", "score"]);
//! table.insert_row("a".to_string(), ["a".into(), flatview::Scalar::Int(3)]);
//! table.insert_row("b".to_string(), ["b".into(), flatview::Scalar::Int(1)]);
//!
//! let mut view = FlatTraversal::default();
//! view.sort_by(&table, &table, SortSpec::new(vec![SortEntry::ascending(1)]))?;
//!
//! view.step_begin()?;
//! view.add_row(&table, "a".to_string())?;
//! view.add_row(&table, "b".to_string())?;
//! view.step_end()?;
//!
//! assert_eq!(view.key_at(0), "b");
//! assert_eq!(view.position_of(&"a".to_string()), Some(1));
//! # Ok::<(), flatview::TraversalError>(())
//! ```

mod compare;
mod config;
mod diagnostics;
mod error;
mod fatal;
mod key;
mod memory;
mod query;
mod source;
mod spec;
mod step;
mod traversal;

pub use compare::{MultiSorter, NanPolicy, compare_values};
pub use config::{
    DEFAULT_PARALLEL_SORT_THRESHOLD, ENV_NAN_POLICY, ENV_PARALLEL_SORT_THRESHOLD, TraversalConfig,
};
pub use error::{InvariantViolation, TraversalError, TraversalResult};
pub use flatview_scalar::{Interner, Scalar, total_cmp_f64};
pub use key::{RowEntry, SortKey, SortKeyBuilder};
pub use memory::MemoryTable;
pub use query::CellRef;
pub use source::{ColumnResolver, PrimaryKey, RowSource};
pub use spec::{SortDirection, SortEntry, SortSpec};
pub use step::{StepPhase, StepStats};
pub use traversal::{FlatTraversal, PositionMap};
