//! Call-site inline caching and late binding for the Onyx runtime.
//!
//! A `CallSite` starts cold and specializes itself as it observes
//! arguments. Three cache tiers back every site:
//!
//! 1. **L0**: the site's current Target rule, a direct call on the hot
//!    path.
//! 2. **L1**: a short per-site history of rules that have matched here
//!    before (monomorphic and low-arity polymorphic sites never leave
//!    L0/L1 after warm-up).
//! 3. **L2**: a bounded rule cache shared by every site constructed
//!    over the same binder, so warm-up cost is paid once per program,
//!    not once per site.
//!
//! On a miss the dispatch driver walks L1, then L2, then asks the
//! binder for a fresh rule; candidates are trialed through a
//! `Matchmaker` so the production Target never points at a rule that
//! has not demonstrably matched.

pub mod binder;
pub mod cache;
pub mod dispatch;
pub mod frames;
pub mod matchmaker;
pub mod ops;
pub mod rule;
pub mod site;

// Re-export the public surface
pub use binder::Binder;
pub use cache::{CacheStats, RuleCache, RULE_CACHE_CAPACITY};
pub use frames::{is_internal_dispatch_frame, INTERNAL_FRAME_PREFIXES};
pub use matchmaker::{MatchFrame, Matchmaker, Trial};
pub use ops::{
    BinaryOperator, CallInfo, ConvertKind, DynOp, MemberSpec, UnaryOperator,
};
pub use rule::Rule;
pub use site::{CallSite, SiteClassification, SiteStats, SITE_HISTORY};
