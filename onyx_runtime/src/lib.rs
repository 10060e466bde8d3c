//! Host value and object model for the Onyx dynamic runtime.
//!
//! This crate provides:
//! - Dynamic values (`Value`, `ValueKind`)
//! - String interning (`Name`)
//! - Shape-based object layout (hidden classes) with cached transitions
//! - Instances, classes, native functions, lists and maps
//! - The dispatch error taxonomy (`DispatchError`, `BindError`)

pub mod error;
pub mod intern;
pub mod object;
pub mod types;
pub mod value;

// Re-export commonly used items
pub use error::{BindError, DispatchError, DispatchResult};
pub use intern::{intern, Name};
pub use object::class::ClassObject;
pub use object::instance::Instance;
pub use object::shape::{
    global_shapes, PropertyDescriptor, PropertyFlags, Shape, ShapeId, ShapeRegistry,
};
pub use types::function::{bind_positional_and_keywords, FunctionObject};
pub use types::list::ListObject;
pub use types::map::MapObject;
pub use value::{Value, ValueKind};
