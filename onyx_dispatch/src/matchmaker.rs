//! No-match signaling and isolated rule trials.
//!
//! A rule communicates "my guard does not hold" by flipping a boolean
//! on the current invocation's `MatchFrame`; the driver checks the flag
//! immediately after the call returns. The flag is reset before every
//! trial.
//!
//! The `Matchmaker` is the throwaway harness the driver uses to probe
//! candidates: a trial runs against a frame that is not the production
//! site's, so a plausible-but-wrong candidate fails cheaply and the
//! site's Target never points at a rule that has not matched. Binder
//! re-entrancy relies on this: `bind` may itself dispatch through
//! nested sites, and those nested misses must never observe a
//! half-updated production Target.

use crate::rule::Rule;
use onyx_runtime::{DispatchResult, Value};
use std::cell::Cell;

// =============================================================================
// Match Frame
// =============================================================================

/// Per-invocation no-match flag.
///
/// Deliberately not `Sync`: a frame belongs to exactly one invocation
/// on one thread. Concurrent invocations of a shared site each carry
/// their own frame.
#[derive(Debug)]
pub struct MatchFrame {
    matched: Cell<bool>,
}

impl MatchFrame {
    /// Fresh frame, in the matched state.
    #[inline]
    pub fn new() -> Self {
        Self {
            matched: Cell::new(true),
        }
    }

    /// Signal that the current rule's guard does not hold.
    #[inline]
    pub fn no_match(&self) {
        self.matched.set(false);
    }

    /// Whether the last invocation matched.
    #[inline]
    pub fn matched(&self) -> bool {
        self.matched.get()
    }

    /// Clear the no-match signal before another trial.
    #[inline]
    pub fn reset(&self) {
        self.matched.set(true);
    }
}

impl Default for MatchFrame {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Matchmaker
// =============================================================================

/// Outcome of trialing one candidate rule.
#[derive(Debug)]
pub enum Trial {
    /// The guard held; here is the operation's result.
    Matched(Value),
    /// The guard did not hold. No effects were produced.
    Rejected,
}

/// Disposable trial harness for candidate rules.
pub struct Matchmaker {
    frame: MatchFrame,
}

impl Matchmaker {
    /// Create a matchmaker for one dispatch pass.
    #[inline]
    pub fn new() -> Self {
        Self {
            frame: MatchFrame::new(),
        }
    }

    /// Run `rule` against `args` in isolation.
    ///
    /// Substantive errors (anything a rule body raises) propagate out
    /// unmodified; only the no-match signal is consumed here.
    pub fn try_rule(&self, rule: &Rule, args: &[Value]) -> DispatchResult<Trial> {
        self.frame.reset();
        let result = rule.invoke(&self.frame, args)?;
        if self.frame.matched() {
            Ok(Trial::Matched(result))
        } else {
            Ok(Trial::Rejected)
        }
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
