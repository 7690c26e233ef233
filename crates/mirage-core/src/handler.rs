//! Call handler trait and supporting types.
//!
//! A handler owns one kind of virtual method semantics. The dispatcher asks
//! each handler of a chain whether it can handle a call (`can_handle`) and
//! runs the first one that can (`execute`). Handlers are shared across
//! calls and threads, so they keep no per-call state.

use mirage_meta::{ClassMetadata, MetadataFactory, PropertyMetadata, TypeContext};
use mirage_sdk::{ObjectRef, Reflector, Value};

use crate::config::HandlerOptions;
use crate::error::{DispatchError, DispatchResult};

/// Static metadata for a handler.
pub struct HandlerMeta {
    /// Identifier the handler is registered under, e.g. "virtual_getter".
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

/// Target of an intercepted call.
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Call on an instance
    Object(ObjectRef),
    /// Call on a class, without an instance
    Class(String),
}

impl Receiver {
    /// Receiver instance, `None` for static calls
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Receiver::Object(object) => Some(object),
            Receiver::Class(_) => None,
        }
    }

    /// Check if this is a static call
    pub fn is_static(&self) -> bool {
        matches!(self, Receiver::Class(_))
    }
}

/// Collaborators available to handlers.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Metadata of other classes, e.g. the target of a fixture builder
    pub metadata: &'a MetadataFactory,
    /// Field access and allocation
    pub reflector: &'a dyn Reflector,
}

impl<'a> HandlerContext<'a> {
    /// Type validation context for values of `class_name`
    pub fn type_context(&self, class_name: &'a str) -> TypeContext<'a> {
        TypeContext {
            class_name,
            reflector: self.reflector,
        }
    }
}

/// Trait that every call handler must implement.
pub trait CallHandler: Send + Sync {
    /// Static metadata for this handler.
    fn meta(&self) -> &HandlerMeta;

    /// Whether the handler needs a receiver instance. Static calls that
    /// select such a handler fail with an invalid static context error.
    fn requires_object_context(&self) -> bool {
        true
    }

    /// Check whether this handler implements `method` for `class`.
    fn can_handle(
        &self,
        method: &str,
        class: &ClassMetadata,
        options: &HandlerOptions,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<bool>;

    /// Run the call. Arity has already been checked; the result is
    /// validated against the declared return type by the caller.
    fn execute(
        &self,
        receiver: &Receiver,
        method: &str,
        arguments: &[Value],
        class: &ClassMetadata,
        options: &HandlerOptions,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Value>;
}

/// Field a prefixed method name refers to.
///
/// With an optional prefix a method named exactly like a field refers to
/// it. Otherwise the prefix is stripped and the first remaining letter
/// lower-cased (`getFirstName` → `firstName`); the result is returned only
/// if `class` has such a field.
pub fn property_name(
    method: &str,
    prefix: &str,
    prefix_mandatory: bool,
    class: &ClassMetadata,
) -> Option<String> {
    if !prefix_mandatory && class.has_property(method) {
        return Some(method.to_string());
    }

    let rest = method.strip_prefix(prefix)?;
    let candidate = lcfirst(rest);
    if !candidate.is_empty() && class.has_property(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Create an instance of `class` with the given field values.
///
/// Every value is validated against its field's declared type before the
/// instance is allocated, so nothing is created when a value is rejected.
/// Fields not listed keep their defaults.
pub fn construct_instance(
    class: &ClassMetadata,
    values: Vec<(&PropertyMetadata, Value)>,
    ctx: &HandlerContext<'_>,
) -> DispatchResult<ObjectRef> {
    let type_context = ctx.type_context(class.name());
    for (property, value) in &values {
        if !property.data_type.accepts(value, &type_context) {
            return Err(DispatchError::FieldTypeMismatch {
                class: property.class.clone(),
                field: property.name.clone(),
                expected: property.data_type.to_string(),
                actual: value.type_name(),
            });
        }
    }

    let object = ctx.reflector.allocate(class.name())?;
    for (property, value) in values {
        ctx.reflector.set_field(&object, &property.name, value)?;
    }
    Ok(object)
}

/// Undefined method error for a class.
pub(crate) fn undefined(class: &ClassMetadata, method: &str) -> DispatchError {
    DispatchError::UndefinedMethod {
        class: class.name().to_string(),
        method: method.to_string(),
    }
}

/// Receiver instance of a call, or an invalid static context error.
pub(crate) fn require_object<'r>(
    receiver: &'r Receiver,
    class: &ClassMetadata,
    method: &str,
) -> DispatchResult<&'r ObjectRef> {
    receiver
        .as_object()
        .ok_or_else(|| DispatchError::InvalidStaticContext {
            class: class.name().to_string(),
            method: method.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_meta::DataType;
    use rustc_hash::FxHashMap;

    fn class_with_fields(fields: &[&str]) -> ClassMetadata {
        let mut class = ClassMetadata::new("App\\Thing", "App", FxHashMap::default());
        for field in fields {
            class.add_property(PropertyMetadata {
                class: "App\\Thing".to_string(),
                name: field.to_string(),
                data_type: DataType::Untyped,
                example: None,
            });
        }
        class
    }

    #[test]
    fn test_property_name_optional_prefix() {
        let class = class_with_fields(&["someProperty", "getter"]);

        assert_eq!(property_name("someProperty", "get", false, &class).as_deref(), Some("someProperty"));
        assert_eq!(property_name("getSomeProperty", "get", false, &class).as_deref(), Some("someProperty"));
        assert_eq!(property_name("getter", "get", false, &class).as_deref(), Some("getter"));
        assert_eq!(property_name("getUnknown", "get", false, &class), None);
        assert_eq!(property_name("get", "get", false, &class), None);
    }

    #[test]
    fn test_property_name_mandatory_prefix() {
        let class = class_with_fields(&["someProperty", "withheld"]);

        assert_eq!(property_name("withSomeProperty", "with", true, &class).as_deref(), Some("someProperty"));
        assert_eq!(property_name("someProperty", "with", true, &class), None);
        assert_eq!(property_name("withheld", "with", true, &class), None);
    }

    #[test]
    fn test_lcfirst() {
        assert_eq!(lcfirst("FirstName"), "firstName");
        assert_eq!(lcfirst("URL"), "uRL");
        assert_eq!(lcfirst(""), "");
    }
}
