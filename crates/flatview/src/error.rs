//! Traversal error types.
//!
//! Only recoverable conditions live here. A corrupted index (duplicate
//! primary key) never becomes a `TraversalError`; see [`crate::fatal`].

use thiserror::Error;

/// Recoverable traversal error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    /// `step_begin` (or a resort) was requested while a step is open.
    #[error("a step is already open")]
    StepAlreadyOpen,

    /// A staging operation or `step_end` was called with no open step.
    #[error("no step is open")]
    NoOpenStep,

    /// The sort specification references a column the resolver does not know.
    #[error("sort column at index {0} is not defined")]
    UnknownColumn(usize),

    /// A sort column has no position in the caller's value-row layout.
    #[error("sort column `{0}` is not part of the value row layout")]
    UnresolvedColumn(String),

    /// A value row is too short to supply a sort column.
    #[error("value row has {len} values but sort column `{column}` is at index {index}")]
    ValueRowTooShort {
        column: String,
        index: usize,
        len: usize,
    },
}

/// Result type for traversal operations.
pub type TraversalResult<T> = Result<T, TraversalError>;

/// Broken index invariant reported by `check_invariants`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The row at `position` sorts after the row that follows it.
    #[error("row at position {position} sorts after its successor")]
    OutOfOrder { position: usize },

    /// Inverse map and index disagree on the number of rows.
    #[error("inverse map holds {map} keys but the index holds {index} rows")]
    SizeMismatch { map: usize, index: usize },

    /// The inverse map points a key at a position holding another key.
    #[error("inverse map points a key at position {position}, which holds a different key")]
    MisplacedKey { position: usize },

    /// A logically deleted row survived a commit.
    #[error("row at position {position} is still marked deleted")]
    DeletedRow { position: usize },
}
