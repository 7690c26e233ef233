//! Mirage SDK - host contracts for the virtual method runtime
//!
//! This crate provides the minimal types and traits a host object runtime
//! needs to implement so that declared-but-unimplemented methods can be
//! resolved by `mirage-core`, without depending on the dispatch machinery.
//!
//! - [`Value`] / [`ObjectRef`]: runtime values and shared object instances
//! - [`Reflector`]: field access and allocation without a constructor
//! - [`DeclarationSource`]: the raw declarations (doc comments, use
//!   statements, fields) metadata is built from
//!
//! # Example
//!
//! ```ignore
//! use mirage_sdk::{Instance, ObjectRef, Value};
//!
//! let object = ObjectRef::new(Instance::new("App\\Model\\User"));
//! object.write().set("name", Value::from("Ada"));
//! assert_eq!(object.read().get("name"), Some(&Value::from("Ada")));
//! ```

#![warn(missing_docs)]

pub mod declaration;
pub mod error;
pub mod reflect;
pub mod value;

pub use declaration::{ClassDeclaration, DeclarationSource, FieldDeclaration};
pub use error::{ReflectError, ReflectResult};
pub use reflect::Reflector;
pub use value::{Instance, ObjectRef, Value};

/// Strip a leading namespace separator from a class name.
///
/// `\App\Model\User` and `App\Model\User` name the same class.
pub fn normalize_class_name(name: &str) -> &str {
    name.strip_prefix('\\').unwrap_or(name)
}

/// Split a fully-qualified class name into its namespace part.
///
/// Returns an empty string for classes in the global namespace.
pub fn namespace_of(class_name: &str) -> &str {
    let name = normalize_class_name(class_name);
    match name.rfind('\\') {
        Some(index) => &name[..index],
        None => "",
    }
}

/// Short (unqualified) name of a class.
pub fn short_name_of(class_name: &str) -> &str {
    let name = normalize_class_name(class_name);
    match name.rfind('\\') {
        Some(index) => &name[index + 1..],
        None => name,
    }
}
