//! Mirage metadata - what a class declares about its virtual methods
//!
//! Turns the raw [`ClassDeclaration`](mirage_sdk::ClassDeclaration) of a
//! class into a cached, immutable [`ClassMetadata`]:
//!
//! - `@method [static] Type name(Type $param)` tags become
//!   [`VirtualMethodMetadata`]
//! - `@property-read Type $name` tags become [`VirtualPropertyMetadata`]
//! - per-field `@var Type` and `@example expr` tags become
//!   [`PropertyMetadata`]
//!
//! Type expressions are resolved against the namespace and use statements
//! of the declaring class into [`DataType`]s that can validate runtime
//! values.

#![warn(missing_docs)]

pub mod docblock;
pub mod error;
pub mod example;
pub mod factory;
pub mod metadata;
pub mod signature;
pub mod types;

pub use error::{ExampleError, MetadataError, MetadataResult};
pub use example::Example;
pub use factory::{build_metadata, MetadataFactory};
pub use metadata::{
    ClassMetadata, ParameterMetadata, PropertyMetadata, VirtualMethodMetadata,
    VirtualPropertyMetadata,
};
pub use types::{DataType, Primitive, TypeContext, TypeScope};
