//! Class objects.
//!
//! A class declares a field list (pre-folded into a shape so every
//! instance starts monomorphic) and optionally a constructor. Without a
//! constructor, instantiation fills the declared fields positionally;
//! with one, the constructor receives the fresh instance followed by
//! the operands and takes over initialization.

use crate::error::{DispatchError, DispatchResult};
use crate::intern::{intern, Name};
use crate::object::instance::Instance;
use crate::object::shape::{Shape, ShapeRegistry};
use crate::types::function::FunctionObject;
use crate::value::Value;
use std::sync::Arc;

/// A class: named field layout plus optional constructor.
pub struct ClassObject {
    name: Name,
    fields: Vec<Name>,
    shape: Arc<Shape>,
    constructor: Option<Arc<FunctionObject>>,
}

impl ClassObject {
    /// Declare a class with positional fields and no constructor.
    pub fn new(name: &str, fields: &[&str], registry: &ShapeRegistry) -> Arc<Self> {
        Self::build(name, fields, registry, None)
    }

    /// Declare a class with a constructor. The constructor's first
    /// parameter receives the fresh instance.
    pub fn with_constructor(
        name: &str,
        fields: &[&str],
        registry: &ShapeRegistry,
        constructor: Arc<FunctionObject>,
    ) -> Arc<Self> {
        Self::build(name, fields, registry, Some(constructor))
    }

    fn build(
        name: &str,
        fields: &[&str],
        registry: &ShapeRegistry,
        constructor: Option<Arc<FunctionObject>>,
    ) -> Arc<Self> {
        let fields: Vec<Name> = fields.iter().map(|f| intern(f)).collect();
        let shape = registry.shape_for_fields(&fields);
        Arc::new(Self {
            name: intern(name),
            fields,
            shape,
            constructor,
        })
    }

    /// Class name.
    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// Declared field names, in slot order.
    #[inline]
    pub fn fields(&self) -> &[Name] {
        &self.fields
    }

    /// The shape every fresh instance starts with.
    #[inline]
    pub fn instance_shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Constructor, if declared.
    #[inline]
    pub fn constructor(&self) -> Option<&Arc<FunctionObject>> {
        self.constructor.as_ref()
    }

    /// Allocate an instance. `args` are positional, already resolved
    /// by the caller (keyword binding happens at the call site).
    pub fn instantiate(&self, args: &[Value]) -> DispatchResult<Value> {
        let instance = Arc::new(Instance::new(Arc::clone(&self.shape)));

        if let Some(constructor) = &self.constructor {
            let mut ctor_args = Vec::with_capacity(args.len() + 1);
            ctor_args.push(Value::Object(Arc::clone(&instance)));
            ctor_args.extend_from_slice(args);
            constructor.call(&ctor_args)?;
            return Ok(Value::Object(instance));
        }

        if args.len() > self.fields.len() {
            return Err(DispatchError::TooManyArguments {
                callee: self.name.text().to_string(),
                expected: self.fields.len(),
                given: args.len(),
            });
        }
        for (field, value) in self.fields.iter().zip(args) {
            if let Some(slot) = self.shape.lookup(*field) {
                instance.write_slot(slot, value.clone());
            }
        }
        Ok(Value::Object(instance))
    }
}

impl std::fmt::Debug for ClassObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassObject")
            .field("name", &self.name.text())
            .field("fields", &self.fields.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
