//! Error types for host reflection calls

/// Result type for reflection calls
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Errors raised by a [`Reflector`](crate::Reflector) implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    /// The class is not known to the host runtime
    #[error("Class \"{0}\" does not exist")]
    UnknownClass(String),

    /// The object has no field with this name
    #[error("Property {class}::${field} does not exist")]
    UnknownField {
        /// Class of the object
        class: String,
        /// Requested field name
        field: String,
    },
}
