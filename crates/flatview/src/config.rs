//! Traversal configuration.
//!
//! Defaults suit interactive views; hosts can override them in code, through
//! serde (e.g. a JSON settings block), or from environment variables.

use serde::{Deserialize, Serialize};

use crate::compare::NanPolicy;

/// Row count at which resorts switch to the parallel sort.
pub const DEFAULT_PARALLEL_SORT_THRESHOLD: usize = 100_000;

/// Environment variable selecting the NaN policy (`greatest` or `missing`).
pub const ENV_NAN_POLICY: &str = "FLATVIEW_NAN_POLICY";

/// Environment variable with the parallel sort threshold; `0` disables it.
pub const ENV_PARALLEL_SORT_THRESHOLD: &str = "FLATVIEW_PARALLEL_SORT_THRESHOLD";

/// Configuration for a [`crate::FlatTraversal`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Placement of NaN values in sort columns.
    pub nan_policy: NanPolicy,
    /// Minimum row count for the parallel sort, `None` to always sort on the
    /// calling thread.
    pub parallel_sort_threshold: Option<usize>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            nan_policy: NanPolicy::default(),
            parallel_sort_threshold: Some(DEFAULT_PARALLEL_SORT_THRESHOLD),
        }
    }
}

impl TraversalConfig {
    /// Set the NaN policy.
    #[must_use]
    pub const fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }

    /// Set the parallel sort threshold.
    #[must_use]
    pub const fn with_parallel_sort_threshold(mut self, threshold: Option<usize>) -> Self {
        self.parallel_sort_threshold = threshold;
        self
    }

    /// Defaults overridden by `FLATVIEW_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Unparsable values are logged and ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_NAN_POLICY) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "greatest" => config.nan_policy = NanPolicy::Greatest,
                "missing" | "as_missing" => config.nan_policy = NanPolicy::AsMissing,
                other => tracing::warn!("ignoring {ENV_NAN_POLICY}={other:?}"),
            }
        }

        if let Some(raw) = lookup(ENV_PARALLEL_SORT_THRESHOLD) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.parallel_sort_threshold = None,
                Ok(threshold) => config.parallel_sort_threshold = Some(threshold),
                Err(e) => tracing::warn!("ignoring {ENV_PARALLEL_SORT_THRESHOLD}={raw:?}: {e}"),
            }
        }

        config
    }

    /// Check whether a resort of `rows` rows should use the parallel sort.
    #[must_use]
    pub fn use_parallel_sort(&self, rows: usize) -> bool {
        self.parallel_sort_threshold
            .is_some_and(|threshold| rows >= threshold)
    }
}
