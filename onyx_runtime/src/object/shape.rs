//! Shapes (hidden classes) for O(1) member access.
//!
//! Objects that acquire the same members in the same order share a
//! `Shape`. A shape maps member names to slot indexes in the instance's
//! storage, so a call site that has observed a shape once can read the
//! slot directly after a single id comparison.
//!
//! # Transitions
//!
//! Adding a member moves an instance to a successor shape. Successors
//! are cached on the originating shape, so the second object taking the
//! same path reuses the same successor and keeps call sites monomorphic:
//!
//! ```text
//!     EmptyShape --"x"--> Shape{x} --"y"--> Shape{x,y}
//! ```
//!
//! Deleting a member is the rare path: it rebuilds a fresh shape from
//! the surviving members and is not cached.
//!
//! # Identity
//!
//! Shape ids are allocated from a process-wide counter, so an id
//! comparison is meaningful even across registries.

use crate::intern::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

// =============================================================================
// Property Attributes
// =============================================================================

bitflags::bitflags! {
    /// Member attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// Member value can be changed.
        const WRITABLE = 1 << 0;
        /// Member appears in enumeration.
        const ENUMERABLE = 1 << 1;
        /// Member can be deleted.
        const CONFIGURABLE = 1 << 2;
    }
}

impl Default for PropertyFlags {
    #[inline]
    fn default() -> Self {
        Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE
    }
}

// =============================================================================
// Property Descriptor
// =============================================================================

/// Describes a single member in a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Member name (interned).
    pub name: Name,
    /// Slot index in the instance's storage.
    pub slot: u16,
    /// Attribute flags.
    pub flags: PropertyFlags,
}

impl PropertyDescriptor {
    /// Create a standard writable member descriptor.
    #[inline]
    pub fn writable(name: Name, slot: u16) -> Self {
        Self {
            name,
            slot,
            flags: PropertyFlags::default(),
        }
    }
}

// =============================================================================
// Shape Id
// =============================================================================

/// Process-wide unique shape identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Raw id value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

static NEXT_SHAPE_ID: AtomicU32 = AtomicU32::new(0);

fn next_shape_id() -> ShapeId {
    ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
}

// =============================================================================
// Shape
// =============================================================================

/// Immutable member layout shared by all instances that took the same
/// member-addition path. Only the transition cache mutates after
/// construction.
pub struct Shape {
    id: ShapeId,
    /// Descriptors in slot order.
    properties: Vec<PropertyDescriptor>,
    /// Name -> slot index.
    index: FxHashMap<Name, u16>,
    /// Cached add-member successors.
    transitions: RwLock<FxHashMap<Name, Arc<Shape>>>,
}

impl Shape {
    fn from_properties(properties: Vec<PropertyDescriptor>) -> Arc<Self> {
        let index = properties
            .iter()
            .map(|desc| (desc.name, desc.slot))
            .collect();
        Arc::new(Self {
            id: next_shape_id(),
            properties,
            index,
            transitions: RwLock::new(FxHashMap::default()),
        })
    }

    /// Shape identifier.
    #[inline]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Number of members.
    #[inline]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Descriptors in slot order.
    #[inline]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Look up a member's slot by interned name.
    #[inline]
    pub fn lookup(&self, name: Name) -> Option<u16> {
        self.index.get(&name).copied()
    }

    /// Case-insensitive member lookup. Falls back to a linear scan;
    /// only case-insensitive binders pay for it.
    pub fn lookup_ignore_case(&self, text: &str) -> Option<u16> {
        self.properties
            .iter()
            .find(|desc| desc.name.text().eq_ignore_ascii_case(text))
            .map(|desc| desc.slot)
    }

    /// Whether a member exists on this shape.
    #[inline]
    pub fn contains(&self, name: Name) -> bool {
        self.index.contains_key(&name)
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id.raw())
            .field("properties", &self.properties.len())
            .finish()
    }
}

// =============================================================================
// Shape Registry
// =============================================================================

/// Allocates and connects shapes.
///
/// Holds the root (empty) shape and counters for transition reuse.
pub struct ShapeRegistry {
    empty: Arc<Shape>,
    shapes_created: AtomicU64,
    transition_hits: AtomicU64,
}

impl ShapeRegistry {
    /// Create a registry with a fresh empty shape.
    pub fn new() -> Self {
        Self {
            empty: Shape::from_properties(Vec::new()),
            shapes_created: AtomicU64::new(1),
            transition_hits: AtomicU64::new(0),
        }
    }

    /// The root shape with no members.
    #[inline]
    pub fn empty_shape(&self) -> Arc<Shape> {
        Arc::clone(&self.empty)
    }

    /// Successor of `base` with `name` appended, reusing the cached
    /// transition when one exists.
    pub fn transition(&self, base: &Arc<Shape>, name: Name, flags: PropertyFlags) -> Arc<Shape> {
        if let Some(next) = base.transitions.read().get(&name) {
            self.transition_hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(next);
        }

        let mut transitions = base.transitions.write();
        // Double-check: another thread may have built it while we waited.
        if let Some(next) = transitions.get(&name) {
            self.transition_hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(next);
        }

        let slot = base.properties.len() as u16;
        let mut properties = base.properties.clone();
        properties.push(PropertyDescriptor { name, slot, flags });
        let next = Shape::from_properties(properties);
        self.shapes_created.fetch_add(1, Ordering::Relaxed);
        transitions.insert(name, Arc::clone(&next));
        next
    }

    /// Shape with `name` removed and surviving members repacked into
    /// consecutive slots. Returns `None` if the member is absent.
    /// Not cached: member deletion is the rare path.
    pub fn shape_without(&self, base: &Arc<Shape>, name: Name) -> Option<Arc<Shape>> {
        if !base.contains(name) {
            return None;
        }
        let properties = base
            .properties
            .iter()
            .filter(|desc| desc.name != name)
            .enumerate()
            .map(|(slot, desc)| PropertyDescriptor {
                name: desc.name,
                slot: slot as u16,
                flags: desc.flags,
            })
            .collect();
        self.shapes_created.fetch_add(1, Ordering::Relaxed);
        Some(Shape::from_properties(properties))
    }

    /// Fold a field list into a shape, reusing transitions so every
    /// class with the same field order shares one shape.
    pub fn shape_for_fields(&self, fields: &[Name]) -> Arc<Shape> {
        let mut shape = self.empty_shape();
        for &field in fields {
            shape = self.transition(&shape, field, PropertyFlags::default());
        }
        shape
    }

    /// (shapes created, cached transition hits).
    pub fn stats(&self) -> (u64, u64) {
        (
            self.shapes_created.load(Ordering::Relaxed),
            self.transition_hits.load(Ordering::Relaxed),
        )
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Global Registry
// =============================================================================

static GLOBAL_SHAPES: OnceLock<ShapeRegistry> = OnceLock::new();

/// Global shape registry used by binders and instances unless a caller
/// supplies its own.
pub fn global_shapes() -> &'static ShapeRegistry {
    GLOBAL_SHAPES.get_or_init(ShapeRegistry::new)
}

// =============================================================================
// Tests
// =============================================================================
