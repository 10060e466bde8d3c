//! The L2 rule cache, shared across every site on one binder.
//!
//! Sites that share a binder share the rules it has synthesized: once
//! any site has resolved a shape, every other site resolves the same
//! shape from here without calling `bind` again.
//!
//! # Consistency
//!
//! One mutex guards the entry list; it is held only for the snapshot,
//! promote and insert operations, never across a rule invocation.
//! Recency order is best-effort under concurrency: interleaved
//! promotes may leave either order, but entries are never lost or
//! duplicated.

use crate::rule::Rule;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum rules retained per binder.
pub const RULE_CACHE_CAPACITY: usize = 32;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Dispatches resolved from this cache.
    pub hits: u64,
    /// Dispatches that walked the cache without a match.
    pub misses: u64,
    /// Rules inserted over the cache's lifetime.
    pub insertions: u64,
    /// Current entry count.
    pub len: usize,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Bounded most-recently-used rule store.
pub struct RuleCache {
    /// Entries, most recently confirmed first.
    entries: Mutex<Vec<Rule>>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
}

impl RuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current candidates in recency order.
    ///
    /// The snapshot is taken under the lock and walked outside it, so a
    /// rule invocation never blocks concurrent sites.
    pub fn candidates(&self) -> SmallVec<[Rule; 8]> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Move a confirmed rule toward the front.
    pub fn promote(&self, rule: &Rule) {
        let mut entries = self.entries.lock();
        if let Some(position) = entries.iter().position(|r| r.same_rule(rule)) {
            if position > 0 {
                let hit = entries.remove(position);
                entries.insert(0, hit);
            }
        }
    }

    /// Insert a freshly bound rule at the front, evicting the least
    /// recently used entry at capacity. Inserting a rule that is
    /// already present promotes it instead.
    pub fn insert(&self, rule: &Rule) {
        let mut entries = self.entries.lock();
        if let Some(position) = entries.iter().position(|r| r.same_rule(rule)) {
            if position > 0 {
                let existing = entries.remove(position);
                entries.insert(0, existing);
            }
            return;
        }
        entries.insert(0, rule.clone());
        entries.truncate(RULE_CACHE_CAPACITY);
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a dispatch was resolved from this cache.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a dispatch walked this cache without a match.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            len: self.len(),
        }
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCache").field("len", &self.len()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_front_and_snapshot_order() {
        let cache = RuleCache::new();
        let a = Rule::unbound();
        let b = Rule::unbound();
        cache.insert(&a);
        cache.insert(&b);

        let snapshot = cache.candidates();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot[0].same_rule(&b));
        assert!(snapshot[1].same_rule(&a));
    }

    #[test]
    fn test_promote_moves_to_front() {
        let cache = RuleCache::new();
        let a = Rule::unbound();
        let b = Rule::unbound();
        cache.insert(&a);
        cache.insert(&b);

        cache.promote(&a);
        let snapshot = cache.candidates();
        assert!(snapshot[0].same_rule(&a));
    }

    #[test]
    fn test_insert_existing_promotes_without_duplicate() {
        let cache = RuleCache::new();
        let a = Rule::unbound();
        let b = Rule::unbound();
        cache.insert(&a);
        cache.insert(&b);
        cache.insert(&a);

        assert_eq!(cache.len(), 2);
        assert!(cache.candidates()[0].same_rule(&a));
    }

    #[test]
    fn test_capacity_evicts_lru() {
        let cache = RuleCache::new();
        let first = Rule::unbound();
        cache.insert(&first);
        for _ in 0..RULE_CACHE_CAPACITY {
            cache.insert(&Rule::unbound());
        }

        assert_eq!(cache.len(), RULE_CACHE_CAPACITY);
        // The oldest entry fell off the back.
        assert!(!cache.candidates().iter().any(|r| r.same_rule(&first)));
    }

    #[test]
    fn test_promote_missing_rule_is_noop() {
        let cache = RuleCache::new();
        cache.insert(&Rule::unbound());
        cache.promote(&Rule::unbound());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats() {
        let cache = RuleCache::new();
        cache.record_hit();
        cache.record_hit();
        cache.record_miss();
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 66.6).abs() < 1.0);
    }

    #[test]
    fn test_concurrent_inserts_never_lose_entries() {
        use std::sync::Arc;
        let cache = Arc::new(RuleCache::new());
        let rules: Vec<Rule> = (0..8).map(|_| Rule::unbound()).collect();

        let handles: Vec<_> = rules
            .iter()
            .map(|rule| {
                let cache = Arc::clone(&cache);
                let rule = rule.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.insert(&rule);
                        cache.promote(&rule);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every distinct rule present exactly once.
        let snapshot = cache.candidates();
        assert_eq!(snapshot.len(), 8);
        for rule in &rules {
            assert_eq!(
                snapshot.iter().filter(|r| r.same_rule(rule)).count(),
                1
            );
        }
    }
}
