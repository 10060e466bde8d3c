//! Rules: guarded, specialized operation implementations.
//!
//! A rule is the unit every cache tier stores: an immutable callable
//! that either (a) observes that its guard holds for the given
//! arguments and produces the operation's result, or (b) reports "no
//! match" through the invocation's `MatchFrame` without any observable
//! effect.
//!
//! Guard evaluation must be pure. Only after the guard passes may the
//! body produce effects or raise the operation's real domain error.
//!
//! Rules are compared by identity: two `bind` calls for the same shape
//! may legitimately produce equivalent but distinct rules.

use crate::matchmaker::MatchFrame;
use onyx_runtime::{DispatchResult, Value};
use std::sync::Arc;

/// Boxed rule callable.
type RuleFn = dyn Fn(&MatchFrame, &[Value]) -> DispatchResult<Value> + Send + Sync;

struct RuleInner {
    target: Box<RuleFn>,
}

/// An immutable guarded specialization of one operation.
///
/// Cloning is cheap (`Arc`); a rule may simultaneously sit in many
/// sites' L1 histories and in a binder's L2 cache.
#[derive(Clone)]
pub struct Rule {
    inner: Arc<RuleInner>,
}

impl Rule {
    /// Wrap a raw callable. The callable is responsible for its own
    /// guard discipline: call `frame.no_match()` and return without
    /// effects when the arguments do not apply.
    pub fn new(
        target: impl Fn(&MatchFrame, &[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(RuleInner {
                target: Box::new(target),
            }),
        }
    }

    /// The normal form: a pure guard plus a body that runs only when
    /// the guard holds.
    pub fn guarded(
        guard: impl Fn(&[Value]) -> bool + Send + Sync + 'static,
        body: impl Fn(&[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(move |frame, args| {
            if guard(args) {
                body(args)
            } else {
                frame.no_match();
                Ok(Value::Null)
            }
        })
    }

    /// The cold-site sentinel: rejects every invocation, forcing the
    /// dispatch driver to run. Stands in for "Target is the update
    /// routine" at site construction.
    pub fn unbound() -> Self {
        Self::new(|frame, _args| {
            frame.no_match();
            Ok(Value::Null)
        })
    }

    /// Execute against one invocation's frame.
    #[inline]
    pub fn invoke(&self, frame: &MatchFrame, args: &[Value]) -> DispatchResult<Value> {
        (self.inner.target)(frame, args)
    }

    /// Identity comparison.
    #[inline]
    pub fn same_rule(&self, other: &Rule) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule({:p})", Arc::as_ptr(&self.inner))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_runtime::DispatchError;

    #[test]
    fn test_guarded_rule_matches() {
        let rule = Rule::guarded(
            |args| matches!(args.first(), Some(Value::Int(_))),
            |args| Ok(Value::Int(args[0].as_int().unwrap_or(0) + 1)),
        );
        let frame = MatchFrame::new();
        let result = rule.invoke(&frame, &[Value::Int(41)]).unwrap();
        assert!(frame.matched());
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn test_guarded_rule_rejects_without_effect() {
        let rule = Rule::guarded(
            |args| matches!(args.first(), Some(Value::Int(_))),
            |_| Ok(Value::Int(0)),
        );
        let frame = MatchFrame::new();
        let result = rule.invoke(&frame, &[Value::str("nope")]).unwrap();
        assert!(!frame.matched());
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_unbound_always_rejects() {
        let rule = Rule::unbound();
        let frame = MatchFrame::new();
        rule.invoke(&frame, &[]).unwrap();
        assert!(!frame.matched());
    }

    #[test]
    fn test_body_error_propagates() {
        let rule = Rule::guarded(|_| true, |_| Err(DispatchError::DivisionByZero));
        let frame = MatchFrame::new();
        let err = rule.invoke(&frame, &[]).unwrap_err();
        assert_eq!(err, DispatchError::DivisionByZero);
    }

    #[test]
    fn test_identity_comparison() {
        let a = Rule::unbound();
        let b = Rule::unbound();
        assert!(a.same_rule(&a));
        assert!(a.same_rule(&a.clone()));
        assert!(!a.same_rule(&b));
    }
}
