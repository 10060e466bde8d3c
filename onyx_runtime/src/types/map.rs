//! String-keyed map objects.

use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A string-keyed map of values.
pub struct MapObject {
    entries: RwLock<FxHashMap<Arc<str>, Value>>,
}

impl MapObject {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or replace `key`.
    pub fn insert(&self, key: impl Into<Arc<str>>, value: Value) {
        self.entries.write().insert(key.into(), value);
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.write().remove(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl Default for MapObject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MapObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapObject").field("len", &self.len()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
