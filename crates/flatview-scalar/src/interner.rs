//! String interning for scalar values.
//!
//! Sort keys are rebuilt for every row on each resort, so the same string
//! payloads are materialized over and over. The interner keeps one shared
//! `Arc<str>` per distinct string: equal strings then share storage and the
//! comparator's pointer fast path short-circuits most equality checks.

use std::sync::Arc;

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::Scalar;

/// Deduplicating store for string payloads.
#[derive(Default)]
pub struct Interner {
    strings: HashSet<Arc<str>, FxBuildHasher>,
}

impl Interner {
    /// Create an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a value, returning a handle that shares storage with every
    /// previously interned equal value.
    ///
    /// Non-string values are returned unchanged.
    pub fn intern(&mut self, value: Scalar) -> Scalar {
        match value {
            Scalar::Str(s) => Scalar::Str(self.intern_str(s)),
            other => other,
        }
    }

    /// Look up the shared handle for a value without inserting it.
    ///
    /// Values that were never interned are returned as-is; they still compare
    /// correctly, just without the pointer fast path.
    #[must_use]
    pub fn lookup(&self, value: &Scalar) -> Scalar {
        match value {
            Scalar::Str(s) => self
                .strings
                .get(&**s)
                .map_or_else(|| value.clone(), |shared| Scalar::Str(Arc::clone(shared))),
            other => other.clone(),
        }
    }

    fn intern_str(&mut self, s: Arc<str>) -> Arc<str> {
        if let Some(shared) = self.strings.get(&*s) {
            return Arc::clone(shared);
        }
        self.strings.insert(Arc::clone(&s));
        s
    }

    /// Number of distinct strings held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Drop strings no handle outside the interner refers to any more.
    ///
    /// Returns the number of strings released.
    pub fn purge_unshared(&mut self) -> usize {
        let before = self.strings.len();
        self.strings.retain(|s| Arc::strong_count(s) > 1);
        before - self.strings.len()
    }

    /// Drop every interned string.
    ///
    /// Handles already given out stay valid; they simply stop being shared
    /// with values interned afterwards.
    pub fn clear(&mut self) {
        self.strings.clear();
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interner")
            .field("strings", &self.strings.len())
            .finish()
    }
}
