//! Dispatch errors

use mirage_meta::{ExampleError, MetadataError};
use mirage_sdk::ReflectError;
use thiserror::Error;

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while resolving or executing a virtual method call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    /// No handler in the chain claims the call
    #[error("Call to undefined method {class}::{method}()")]
    UndefinedMethod {
        /// Receiver class
        class: String,
        /// Called method
        method: String,
    },

    /// A static call selected a handler that needs a receiver instance
    #[error("Calling a non-static method when not in object context.")]
    InvalidStaticContext {
        /// Called class
        class: String,
        /// Called method
        method: String,
    },

    /// Argument count differs from the declared parameter count
    #[error(
        "Too {qualifier} arguments to function {class}::{method}(), \
         {passed} passed and exactly {expected} expected",
        qualifier = arity_qualifier(.passed, .expected)
    )]
    ArityMismatch {
        /// Receiver class
        class: String,
        /// Called method
        method: String,
        /// Number of arguments supplied
        passed: usize,
        /// Number of declared parameters
        expected: usize,
    },

    /// The handler result does not conform to the declared return type
    #[error("Return value of {class}::{method}() must be of the type {expected}, {actual} returned")]
    ReturnTypeMismatch {
        /// Receiver class
        class: String,
        /// Called method
        method: String,
        /// Declared return type
        expected: String,
        /// Runtime type of the result
        actual: String,
    },

    /// A value assigned to a field does not conform to its declared type
    #[error("Cannot assign {actual} to property {class}::${field} of type {expected}")]
    FieldTypeMismatch {
        /// Class declaring the field
        class: String,
        /// Field name
        field: String,
        /// Declared field type
        expected: String,
        /// Runtime type of the value
        actual: String,
    },

    /// A fixture field has neither a staged value nor an example
    #[error("No value configured for property {class}::${field} and no @example declared")]
    MissingDefault {
        /// Class declaring the field
        class: String,
        /// Field name
        field: String,
    },

    /// The staged-values field of a fixture builder holds something else
    #[error("Property {class}::${field} must hold the staged values of a builder, {actual} found")]
    InvalidBuilderState {
        /// Builder class
        class: String,
        /// Staged-values field
        field: String,
        /// Runtime type of the field value
        actual: String,
    },

    /// A handler option is missing or malformed
    #[error("Invalid option \"{option}\" for handler \"{handler}\": {message}")]
    InvalidOption {
        /// Handler identifier
        handler: String,
        /// Option key
        option: String,
        /// What went wrong
        message: String,
    },

    /// No handler is registered under this identifier
    #[error("Unknown call handler \"{0}\"")]
    UnknownHandler(String),

    /// Hook configuration could not be loaded
    #[error("Invalid hook configuration: {0}")]
    InvalidConfig(String),

    /// A class was defined twice
    #[error("Cannot redeclare class {0}")]
    DuplicateClass(String),

    /// Metadata could not be built
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Field access or allocation failed
    #[error(transparent)]
    Reflect(#[from] ReflectError),

    /// An example expression could not be evaluated
    #[error(transparent)]
    Example(#[from] ExampleError),
}

fn arity_qualifier(passed: &usize, expected: &usize) -> &'static str {
    if passed < expected {
        "few"
    } else {
        "many"
    }
}
