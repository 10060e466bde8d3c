//! Recognizing the dispatch layer's own stack frames.
//!
//! Stack-introspection tools (debuggers, profilers, error reporters)
//! want user-visible call stacks that read as if dynamic operations
//! were direct calls. This predicate lets them hide the dispatch
//! machinery's frames: it classifies a symbolicated (demangled) frame
//! name as internal when it belongs to the driver, site, matchmaker or
//! rule plumbing.
//!
//! Binder implementations and rule bodies are deliberately NOT
//! internal: they perform the user-visible operation.

/// Module paths whose frames belong to the dispatch machinery.
pub const INTERNAL_FRAME_PREFIXES: &[&str] = &[
    "onyx_dispatch::site::",
    "onyx_dispatch::dispatch::",
    "onyx_dispatch::matchmaker::",
    "onyx_dispatch::rule::",
    "onyx_dispatch::cache::",
];

/// Whether a demangled frame symbol belongs to the dispatch machinery.
///
/// Accepts plain paths (`onyx_dispatch::site::CallSite::invoke`),
/// hash-suffixed symbols, and generic-impl frames wrapped in angle
/// brackets.
pub fn is_internal_dispatch_frame(symbol: &str) -> bool {
    let trimmed = symbol.trim_start_matches(['<', '&']);
    INTERNAL_FRAME_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix) || symbol.contains(prefix))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_frames_are_internal() {
        assert!(is_internal_dispatch_frame(
            "onyx_dispatch::dispatch::update_and_invoke"
        ));
        assert!(is_internal_dispatch_frame(
            "onyx_dispatch::site::CallSite::invoke::h9f3a1c2e77b01d42"
        ));
        assert!(is_internal_dispatch_frame(
            "<onyx_dispatch::rule::Rule>::invoke"
        ));
    }

    #[test]
    fn test_user_frames_are_not_internal() {
        assert!(!is_internal_dispatch_frame("my_app::main"));
        assert!(!is_internal_dispatch_frame(
            "onyx_runtime::object::instance::Instance::get_member"
        ));
        assert!(!is_internal_dispatch_frame(
            "onyx_dispatch::ops::member::generic_get"
        ));
    }
}
