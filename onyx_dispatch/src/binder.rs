//! The binder contract.
//!
//! A binder is the policy object behind a family of call sites: it
//! knows one operation (its kind and static metadata) and synthesizes
//! rules for the argument shapes the sites actually observe.
//!
//! Binding is total: `bind` either reports a malformed operation shape
//! (`BindError`, checked before any rule executes) or returns a rule.
//! When no specialization applies, the returned rule is a generic
//! fallback that performs the operation by the slow path and
//! succeeds-or-raises-the-real-domain-error; a binder never answers
//! "no rule", so dispatch cannot deadlock.
//!
//! Binders are immutable apart from their rule cache and may be shared
//! by any number of sites; `bind` may be called redundantly from racing
//! sites and must tolerate it (at worst an equivalent rule is
//! re-synthesized).

use crate::cache::RuleCache;
use crate::ops::DynOp;
use crate::rule::Rule;
use onyx_runtime::{BindError, Value};

/// Policy object that synthesizes rules for one operation.
pub trait Binder: Send + Sync {
    /// The operation this binder implements.
    fn operation(&self) -> &DynOp;

    /// The L2 cache shared by every site on this binder.
    fn rule_cache(&self) -> &RuleCache;

    /// Synthesize a rule for the observed arguments.
    fn bind(&self, args: &[Value]) -> Result<Rule, BindError>;
}
