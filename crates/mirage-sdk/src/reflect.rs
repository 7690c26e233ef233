//! Reflector trait - field access without declared accessors
//!
//! The dispatch core never touches instance internals directly. Reading a
//! backing field, writing it, and creating an instance while skipping any
//! constructor logic all go through this interface, so a host can back it
//! with generated accessors, indexed structs, or a plain field map.

use crate::error::ReflectResult;
use crate::value::{ObjectRef, Value};

/// Capability interface over the host object runtime
pub trait Reflector: Send + Sync {
    /// Read the current value of a field
    fn get_field(&self, object: &ObjectRef, field: &str) -> ReflectResult<Value>;

    /// Overwrite the value of a field
    fn set_field(&self, object: &ObjectRef, field: &str, value: Value) -> ReflectResult<()>;

    /// Create an instance of `class_name` without running a constructor.
    ///
    /// Fields start out at their declared default values.
    fn allocate(&self, class_name: &str) -> ReflectResult<ObjectRef>;

    /// Check if the host knows the class
    fn class_exists(&self, class_name: &str) -> bool;

    /// Check if `class_name` is `ancestor` or inherits from it
    fn is_subclass_of(&self, class_name: &str, ancestor: &str) -> bool;

    /// Check if `value` is an object whose class is, or inherits from, `class_name`
    fn is_instance_of(&self, value: &Value, class_name: &str) -> bool {
        match value {
            Value::Object(object) => self.is_subclass_of(&object.class_name(), class_name),
            _ => false,
        }
    }
}
