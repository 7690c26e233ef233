//! Metadata extraction errors

use mirage_sdk::ReflectError;
use thiserror::Error;

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while building class metadata
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetadataError {
    /// The declaration source does not know the class
    #[error("Class \"{class}\" does not exist")]
    UnknownClass {
        /// Requested class name
        class: String,
    },

    /// A virtual method parameter declares a default value
    #[error(
        "Default values are not supported in virtual method declarations: \
         parameter ${parameter} of {class}::{method}()"
    )]
    UnsupportedDeclaration {
        /// Declaring class
        class: String,
        /// Method name
        method: String,
        /// Parameter carrying the default value
        parameter: String,
    },

    /// A tag body could not be parsed
    #[error("Invalid @{tag} declaration in {class}: {message}")]
    InvalidSignature {
        /// Declaring class
        class: String,
        /// Tag name without the `@`
        tag: String,
        /// What went wrong
        message: String,
    },

    /// A type expression could not be parsed
    #[error("Invalid type \"{expression}\" in {class}: {message}")]
    InvalidType {
        /// Declaring class
        class: String,
        /// The offending type expression
        expression: String,
        /// What went wrong
        message: String,
    },
}

/// Errors raised while parsing or evaluating an example expression
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExampleError {
    /// The expression is outside the supported literal grammar
    #[error("Invalid example expression `{expression}`: {message}")]
    Syntax {
        /// The expression as written
        expression: String,
        /// What went wrong
        message: String,
    },

    /// `new` was given constructor arguments
    #[error("Example `new {class}(...)` must not pass constructor arguments")]
    ConstructorArguments {
        /// Class being instantiated
        class: String,
    },

    /// Allocation of an example object failed
    #[error(transparent)]
    Reflect(#[from] ReflectError),
}
