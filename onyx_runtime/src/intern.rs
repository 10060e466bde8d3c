//! String interning for member and parameter names.
//!
//! Interned names compare by a 32-bit id, so guard checks and shape
//! lookups never touch string data on the hot path. The table is global
//! and concurrent: binders, shapes and call sites intern from any thread.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

/// Handle to an interned string.
///
/// Equality and hashing operate on the id only; two `Name`s are equal
/// iff they were interned from the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl Name {
    /// Raw id, usable as a compact map key.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Resolve back to the interned text.
    #[inline]
    pub fn text(self) -> Arc<str> {
        interner().resolve(self)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

// =============================================================================
// Interner
// =============================================================================

/// Two-way interning table.
///
/// Forward and reverse maps are kept in separate shards; an id becomes
/// visible to `resolve` before `intern` returns it to the caller.
struct Interner {
    forward: DashMap<Arc<str>, u32>,
    reverse: DashMap<u32, Arc<str>>,
    next: AtomicU32,
}

impl Interner {
    fn new() -> Self {
        Self {
            forward: DashMap::new(),
            reverse: DashMap::new(),
            next: AtomicU32::new(0),
        }
    }

    fn intern(&self, text: &str) -> Name {
        if let Some(id) = self.forward.get(text) {
            return Name(*id);
        }
        let shared: Arc<str> = Arc::from(text);
        let entry = self.forward.entry(Arc::clone(&shared)).or_insert_with(|| {
            let id = self.next.fetch_add(1, Ordering::Relaxed);
            self.reverse.insert(id, shared);
            id
        });
        Name(*entry)
    }

    fn resolve(&self, name: Name) -> Arc<str> {
        self.reverse
            .get(&name.0)
            .map(|text| Arc::clone(&text))
            .unwrap_or_else(|| Arc::from(""))
    }
}

static INTERNER: OnceLock<Interner> = OnceLock::new();

fn interner() -> &'static Interner {
    INTERNER.get_or_init(Interner::new)
}

/// Intern a string, returning its stable `Name` handle.
#[inline]
pub fn intern(text: &str) -> Name {
    interner().intern(text)
}

// =============================================================================
// Tests
// =============================================================================
