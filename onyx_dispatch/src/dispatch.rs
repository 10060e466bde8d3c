//! The dispatch driver: what runs when the fast path reports no match.
//!
//! Three levels, locality first:
//!
//! 1. **L1**: this site's own history, most recently successful rule
//!    first, skipping the rule that just rejected.
//! 2. **L2**: the binder's shared cache, so a shape resolved at any
//!    sibling site is reused here without rebinding.
//! 3. **Bind**: ask the binder for a fresh rule and trial it; repeat
//!    if the binder hands back a guard that is immediately falsified
//!    (tolerated, though a well-formed binder does not do it). The loop
//!    is bounded only by the binder's own termination guarantee.
//!
//! Every candidate is trialed through the `Matchmaker`; only a rule
//! that has demonstrably matched is committed to the site's Target and
//! history, and promoted or inserted in L2. The production Target is
//! never dirtied by a failed candidate, so re-entrant misses on the
//! same site (a `bind` that itself dispatches) always observe a
//! consistent baseline.
//!
//! A rule that raises a substantive error is not retried and the error
//! propagates unmodified: caching must be invisible to the operation's
//! error model.

use crate::matchmaker::{Matchmaker, Trial};
use crate::rule::Rule;
use crate::site::CallSite;
use onyx_runtime::{DispatchError, DispatchResult, Value};

/// Resolve a miss at `site`. `original` is the Target that rejected,
/// recorded so it is not retried within this pass.
pub(crate) fn update_and_invoke(
    site: &CallSite,
    original: &Rule,
    args: &[Value],
) -> DispatchResult<Value> {
    let matchmaker = Matchmaker::new();

    // Level 1: this site's history, most recent first.
    for candidate in &site.history_snapshot() {
        if candidate.same_rule(original) {
            continue;
        }
        match matchmaker.try_rule(candidate, args)? {
            Trial::Matched(value) => {
                site.set_target(candidate);
                site.promote_history(candidate);
                return Ok(value);
            }
            Trial::Rejected => {}
        }
    }

    // Level 2: rules shared across every site on this binder.
    let cache = site.binder().rule_cache();
    for candidate in &cache.candidates() {
        match matchmaker.try_rule(candidate, args)? {
            Trial::Matched(value) => {
                site.set_target(candidate);
                site.remember(candidate);
                cache.promote(candidate);
                cache.record_hit();
                return Ok(value);
            }
            Trial::Rejected => {}
        }
    }
    cache.record_miss();

    // Level 3: ask the binder until a freshly bound rule sticks.
    loop {
        site.note_bind();
        let rule = site
            .binder()
            .bind(args)
            .map_err(DispatchError::from)?;
        match matchmaker.try_rule(&rule, args)? {
            Trial::Matched(value) => {
                site.set_target(&rule);
                site.remember(&rule);
                cache.insert(&rule);
                return Ok(value);
            }
            Trial::Rejected => {
                // Immediately falsified guard; ask again.
            }
        }
    }
}
