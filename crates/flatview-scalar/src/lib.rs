//! Scalar values for flatview.
//!
//! - [`Scalar`]: a cell value with a canonical total order (missing values
//!   first, NaN above every other float) that is safe to use as a hash key.
//! - [`Interner`]: shares string payloads so repeated comparisons of equal
//!   values stay cheap.

mod interner;
mod scalar;

pub use interner::Interner;
pub use scalar::{Scalar, total_cmp_f64};
