//! Instances: shape pointer plus slot storage.
//!
//! The methods here are the generic slow path. Call sites that have
//! observed an instance's shape bypass them entirely: a guarded rule
//! compares `shape_id()` and then touches the slot directly via
//! `read_slot` / `write_slot`.
//!
//! # Locking
//!
//! Shape and slots have separate locks; writers that need both take the
//! shape lock first. Slot reads are bounds-checked so a reader racing a
//! deletion sees a stale value or `Null`, never a panic.

use crate::intern::Name;
use crate::object::shape::{PropertyFlags, Shape, ShapeId, ShapeRegistry};
use crate::value::Value;
use parking_lot::RwLock;
use std::sync::Arc;

/// A dynamic object instance.
pub struct Instance {
    shape: RwLock<Arc<Shape>>,
    slots: RwLock<Vec<Value>>,
}

impl Instance {
    /// Create an instance of the given shape with all slots null.
    pub fn new(shape: Arc<Shape>) -> Self {
        let slots = vec![Value::Null; shape.property_count()];
        Self {
            shape: RwLock::new(shape),
            slots: RwLock::new(slots),
        }
    }

    /// Current shape.
    #[inline]
    pub fn shape(&self) -> Arc<Shape> {
        Arc::clone(&self.shape.read())
    }

    /// Current shape id (the value guards compare against).
    #[inline]
    pub fn shape_id(&self) -> ShapeId {
        self.shape.read().id()
    }

    /// Direct slot read. Out-of-range slots read as null.
    #[inline]
    pub fn read_slot(&self, slot: u16) -> Value {
        self.slots
            .read()
            .get(slot as usize)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Direct slot write. Out-of-range writes are dropped.
    #[inline]
    pub fn write_slot(&self, slot: u16, value: Value) {
        if let Some(cell) = self.slots.write().get_mut(slot as usize) {
            *cell = value;
        }
    }

    /// Generic member read.
    pub fn get_member(&self, name: Name) -> Option<Value> {
        let shape = self.shape.read();
        let slot = shape.lookup(name)?;
        drop(shape);
        Some(self.read_slot(slot))
    }

    /// Generic case-insensitive member read.
    pub fn get_member_ignore_case(&self, text: &str) -> Option<Value> {
        let shape = self.shape.read();
        let slot = shape.lookup_ignore_case(text)?;
        drop(shape);
        Some(self.read_slot(slot))
    }

    /// Generic member write. Adds the member (with a shape transition)
    /// when absent.
    pub fn set_member(&self, name: Name, value: Value, registry: &ShapeRegistry) {
        let mut shape = self.shape.write();
        if let Some(slot) = shape.lookup(name) {
            if let Some(cell) = self.slots.write().get_mut(slot as usize) {
                *cell = value;
            }
            return;
        }

        let next = registry.transition(&shape, name, PropertyFlags::default());
        let mut slots = self.slots.write();
        slots.resize(next.property_count(), Value::Null);
        if let Some(slot) = next.lookup(name) {
            if let Some(cell) = slots.get_mut(slot as usize) {
                *cell = value;
            }
        }
        *shape = next;
    }

    /// Generic member delete. Survivors are repacked into the reduced
    /// shape's slot order. Returns false if the member is absent.
    pub fn delete_member(&self, name: Name, registry: &ShapeRegistry) -> bool {
        let mut shape = self.shape.write();
        let Some(next) = registry.shape_without(&shape, name) else {
            return false;
        };

        let mut slots = self.slots.write();
        let mut repacked = vec![Value::Null; next.property_count()];
        for desc in next.properties() {
            if let Some(old_slot) = shape.lookup(desc.name) {
                if let Some(value) = slots.get(old_slot as usize) {
                    if let Some(cell) = repacked.get_mut(desc.slot as usize) {
                        *cell = value.clone();
                    }
                }
            }
        }
        *slots = repacked;
        *shape = next;
        true
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("shape", &self.shape_id().raw())
            .field("slots", &self.slots.read().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
