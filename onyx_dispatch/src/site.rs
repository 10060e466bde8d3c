//! Call sites: the L0 target and L1 history.
//!
//! One `CallSite` stands for one point in a program where a dynamic
//! operation occurs repeatedly. The site handle itself is the
//! operation's self-describing context: `site.invoke(args)` is the
//! whole invocation contract.
//!
//! # Fast path
//!
//! `invoke` clones the Target under a read lock (never held across the
//! call), runs it with a stack-allocated frame, and returns on a match.
//! A cold site's Target is the always-rejecting sentinel, so the first
//! invocation falls straight into the dispatch driver.
//!
//! # Concurrency
//!
//! Sites are shared, mutable singletons; any number of threads may
//! invoke one concurrently. Every mutation is a whole-`Rule` replace
//! under a lock scoped to the replace itself. Two threads that miss
//! simultaneously may both rebind: duplicated work, never corruption.

use crate::binder::Binder;
use crate::dispatch;
use crate::matchmaker::MatchFrame;
use crate::rule::Rule;
use onyx_runtime::{DispatchResult, Value};
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Maximum rules remembered per site (L1 capacity).
pub const SITE_HISTORY: usize = 10;

// =============================================================================
// Site Statistics
// =============================================================================

/// Snapshot of a site's counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteStats {
    /// Total invocations.
    pub calls: u64,
    /// Invocations that left the fast path.
    pub misses: u64,
    /// Binder calls made on behalf of this site.
    pub binds: u64,
    /// L1 entries evicted at capacity.
    pub evictions: u64,
}

impl SiteStats {
    /// Fast-path hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            ((self.calls - self.misses) as f64 / self.calls as f64) * 100.0
        }
    }
}

/// Classification of a site's observed shape population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteClassification {
    /// Never successfully dispatched.
    Cold,
    /// One rule has matched here.
    Monomorphic,
    /// A bounded few rules have matched here.
    Polymorphic,
    /// More rules than the history holds; evictions have occurred.
    Megamorphic,
}

// =============================================================================
// Call Site
// =============================================================================

/// A self-specializing dynamic call site.
pub struct CallSite {
    binder: Arc<dyn Binder>,
    /// L0: the current fast-path rule.
    target: RwLock<Rule>,
    /// L1: rules that have matched at this site, most recent first.
    history: Mutex<SmallVec<[Rule; SITE_HISTORY]>>,
    calls: AtomicU64,
    misses: AtomicU64,
    binds: AtomicU64,
    evictions: AtomicU64,
}

impl CallSite {
    /// Construct a cold site over a binder.
    pub fn new(binder: Arc<dyn Binder>) -> Arc<Self> {
        Arc::new(Self {
            binder,
            target: RwLock::new(Rule::unbound()),
            history: Mutex::new(SmallVec::new()),
            calls: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            binds: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    /// The binder this site dispatches through.
    #[inline]
    pub fn binder(&self) -> &Arc<dyn Binder> {
        &self.binder
    }

    /// Current Target rule.
    #[inline]
    pub fn target(&self) -> Rule {
        self.target.read().clone()
    }

    /// Invoke the operation.
    ///
    /// Domain errors and binding failures propagate to the caller
    /// unmodified; the no-match signal never escapes this call.
    pub fn invoke(&self, args: &[Value]) -> DispatchResult<Value> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        // L0: direct call through the current target.
        let target = self.target();
        let frame = MatchFrame::new();
        let result = target.invoke(&frame, args)?;
        if frame.matched() {
            return Ok(result);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        dispatch::update_and_invoke(self, &target, args)
    }

    // =========================================================================
    // Driver-side mutation (whole-Rule replaces under narrow locks)
    // =========================================================================

    /// Install a new Target.
    pub(crate) fn set_target(&self, rule: &Rule) {
        *self.target.write() = rule.clone();
    }

    /// Snapshot of the L1 history, most recent first.
    pub(crate) fn history_snapshot(&self) -> SmallVec<[Rule; SITE_HISTORY]> {
        self.history.lock().clone()
    }

    /// Move an L1 resident to the front.
    pub(crate) fn promote_history(&self, rule: &Rule) {
        let mut history = self.history.lock();
        if let Some(position) = history.iter().position(|r| r.same_rule(rule)) {
            if position > 0 {
                let hit = history.remove(position);
                history.insert(0, hit);
            }
        }
    }

    /// Remember a rule that just matched here, evicting the least
    /// recently used entry at capacity.
    pub(crate) fn remember(&self, rule: &Rule) {
        let mut history = self.history.lock();
        if let Some(position) = history.iter().position(|r| r.same_rule(rule)) {
            if position > 0 {
                let existing = history.remove(position);
                history.insert(0, existing);
            }
            return;
        }
        if history.len() == SITE_HISTORY {
            history.pop();
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        history.insert(0, rule.clone());
    }

    /// Count a binder call.
    pub(crate) fn note_bind(&self) {
        self.binds.fetch_add(1, Ordering::Relaxed);
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Counter snapshot.
    pub fn stats(&self) -> SiteStats {
        SiteStats {
            calls: self.calls.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            binds: self.binds.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Number of rules currently remembered (≤ `SITE_HISTORY`).
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Classify the site by its observed rule population.
    pub fn classification(&self) -> SiteClassification {
        if self.evictions.load(Ordering::Relaxed) > 0 {
            return SiteClassification::Megamorphic;
        }
        match self.history_len() {
            0 => SiteClassification::Cold,
            1 => SiteClassification::Monomorphic,
            _ => SiteClassification::Polymorphic,
        }
    }
}

impl std::fmt::Debug for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSite")
            .field("operation", self.binder.operation())
            .field("history", &self.history_len())
            .field("stats", &self.stats())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RuleCache;
    use crate::ops::DynOp;
    use onyx_runtime::BindError;

    /// Binder whose rules match any arguments and return a fixed int.
    struct ConstBinder {
        op: DynOp,
        cache: RuleCache,
        result: i64,
    }

    impl ConstBinder {
        fn new(result: i64) -> Arc<Self> {
            Arc::new(Self {
                op: DynOp::Invoke(crate::ops::CallInfo::positional(0)),
                cache: RuleCache::new(),
                result,
            })
        }
    }

    impl Binder for ConstBinder {
        fn operation(&self) -> &DynOp {
            &self.op
        }
        fn rule_cache(&self) -> &RuleCache {
            &self.cache
        }
        fn bind(&self, _args: &[Value]) -> Result<Rule, BindError> {
            let result = self.result;
            Ok(Rule::guarded(|_| true, move |_| Ok(Value::Int(result))))
        }
    }

    #[test]
    fn test_cold_site_binds_once_then_fast_paths() {
        let binder = ConstBinder::new(7);
        let site = CallSite::new(binder);

        assert_eq!(site.classification(), SiteClassification::Cold);
        assert_eq!(site.invoke(&[]).unwrap(), Value::Int(7));
        assert_eq!(site.invoke(&[]).unwrap(), Value::Int(7));

        let stats = site.stats();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.binds, 1);
        assert_eq!(site.classification(), SiteClassification::Monomorphic);
    }

    #[test]
    fn test_history_capacity_and_eviction_counter() {
        let binder = ConstBinder::new(0);
        let site = CallSite::new(binder);
        for _ in 0..SITE_HISTORY + 3 {
            site.remember(&Rule::unbound());
        }
        assert_eq!(site.history_len(), SITE_HISTORY);
        assert_eq!(site.stats().evictions, 3);
        assert_eq!(site.classification(), SiteClassification::Megamorphic);
    }

    #[test]
    fn test_remember_existing_promotes() {
        let binder = ConstBinder::new(0);
        let site = CallSite::new(binder);
        let a = Rule::unbound();
        let b = Rule::unbound();
        site.remember(&a);
        site.remember(&b);
        site.remember(&a);

        assert_eq!(site.history_len(), 2);
        assert!(site.history_snapshot()[0].same_rule(&a));
    }

    #[test]
    fn test_stats_hit_rate() {
        let binder = ConstBinder::new(1);
        let site = CallSite::new(binder);
        for _ in 0..10 {
            site.invoke(&[]).unwrap();
        }
        let stats = site.stats();
        assert_eq!(stats.calls, 10);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 90.0).abs() < f64::EPSILON);
    }
}
