//! Handler: named_constructor
//!
//! Implements declared static factory methods such as
//! `@method static self create(string $name, int $age)`. The new instance
//! is allocated without running a constructor and every field receives the
//! argument at the same position, in field declaration order.
//!
//! Options:
//! - `method_name` (required): the factory method this chain entry serves.

use mirage_meta::{ClassMetadata, DataType};
use mirage_sdk::Value;

use crate::config::HandlerOptions;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::*;

/// Static factory methods, see the module documentation
pub struct NamedConstructor;

/// Option naming the factory method a chain entry serves
pub const METHOD_NAME_OPTION: &str = "method_name";

static META: HandlerMeta = HandlerMeta {
    id: "named_constructor",
    description: "Static factory methods assigning arguments to fields by position",
};

impl CallHandler for NamedConstructor {
    fn meta(&self) -> &HandlerMeta {
        &META
    }

    fn requires_object_context(&self) -> bool {
        false
    }

    fn can_handle(
        &self,
        method: &str,
        class: &ClassMetadata,
        options: &HandlerOptions,
        _ctx: &HandlerContext<'_>,
    ) -> DispatchResult<bool> {
        let target = options.require(META.id, METHOD_NAME_OPTION)?;
        if method != target {
            return Ok(false);
        }

        let declared = match class.virtual_method(method) {
            Some(declared) => declared,
            None => return Ok(false),
        };

        // Every parameter must name a field; positions follow field order.
        Ok(declared.is_static
            && declared.return_type == Some(DataType::SelfType)
            && declared.arity() == class.properties().len()
            && declared
                .parameters
                .iter()
                .all(|parameter| class.has_property(&parameter.name)))
    }

    fn execute(
        &self,
        _receiver: &Receiver,
        method: &str,
        arguments: &[Value],
        class: &ClassMetadata,
        _options: &HandlerOptions,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Value> {
        let properties = class.properties();
        if arguments.len() != properties.len() {
            return Err(DispatchError::ArityMismatch {
                class: class.name().to_string(),
                method: method.to_string(),
                passed: arguments.len(),
                expected: properties.len(),
            });
        }

        let values = properties.iter().zip(arguments.iter().cloned()).collect();
        let object = construct_instance(class, values, ctx)?;
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_for, Fixture};

    const FIELDS: &[(&str, &str)] = &[
        ("firstProperty", "/** @var string */"),
        ("secondProperty", "/** @var int */"),
    ];

    fn fixture(doc: &str) -> Fixture {
        Fixture::single("App\\Command", doc, FIELDS)
    }

    fn can_handle(doc: &str, method: &str) -> bool {
        let fixture = fixture(doc);
        let class = fixture.metadata("App\\Command");
        let options = HandlerOptions::new().with(METHOD_NAME_OPTION, "create");
        NamedConstructor
            .can_handle(method, &class, &options, &context_for(&fixture))
            .unwrap()
    }

    #[test]
    fn test_matching_declaration() {
        assert!(can_handle(
            "/** @method static self create(string $firstProperty, int $secondProperty) */",
            "create"
        ));
    }

    #[test]
    fn test_other_method_name() {
        assert!(!can_handle(
            "/** @method static self build(string $firstProperty, int $secondProperty) */",
            "build"
        ));
    }

    #[test]
    fn test_non_static_declaration() {
        assert!(!can_handle(
            "/** @method self create(string $firstProperty, int $secondProperty) */",
            "create"
        ));
    }

    #[test]
    fn test_parameter_count_differs_from_fields() {
        assert!(!can_handle(
            "/** @method static self create(string $firstProperty, int $secondProperty, int $third) */",
            "create"
        ));
    }

    #[test]
    fn test_undeclared_method() {
        assert!(!can_handle("/** @method static self other() */", "create"));
    }

    #[test]
    fn test_foreign_return_type() {
        assert!(!can_handle(
            "/** @method static \\DateTime create(string $firstProperty, int $secondProperty) */",
            "create"
        ));
    }

    #[test]
    fn test_static_return_type() {
        assert!(!can_handle(
            "/** @method static static create(string $firstProperty, int $secondProperty) */",
            "create"
        ));
    }

    #[test]
    fn test_own_class_return_type() {
        assert!(!can_handle(
            "/** @method static Command create(string $firstProperty, int $secondProperty) */",
            "create"
        ));
    }

    #[test]
    fn test_unknown_property_parameter() {
        assert!(!can_handle(
            "/** @method static self create(string $firstProperty, int $unknownProperty) */",
            "create"
        ));
    }

    #[test]
    fn test_missing_option() {
        let fixture = fixture("/** @method static self create(string $firstProperty, int $secondProperty) */");
        let class = fixture.metadata("App\\Command");
        let err = NamedConstructor
            .can_handle("create", &class, &HandlerOptions::new(), &context_for(&fixture))
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidOption { .. }));
    }

    #[test]
    fn test_execute_assigns_fields_by_position() {
        let fixture = fixture("/** @method static self create(string $firstProperty, int $secondProperty) */");
        let class = fixture.metadata("App\\Command");

        let value = NamedConstructor
            .execute(
                &Receiver::Class("App\\Command".to_string()),
                "create",
                &[Value::from("a"), Value::from(42)],
                &class,
                &HandlerOptions::new(),
                &context_for(&fixture),
            )
            .unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.class_name(), "App\\Command");
        assert_eq!(object.read().get("firstProperty"), Some(&Value::from("a")));
        assert_eq!(object.read().get("secondProperty"), Some(&Value::from(42)));
    }

    #[test]
    fn test_execute_rejects_mistyped_field() {
        let fixture = fixture("/** @method static self create(string $firstProperty, int $secondProperty) */");
        let class = fixture.metadata("App\\Command");

        let err = NamedConstructor
            .execute(
                &Receiver::Class("App\\Command".to_string()),
                "create",
                &[Value::from("a"), Value::from("42")],
                &class,
                &HandlerOptions::new(),
                &context_for(&fixture),
            )
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Cannot assign string to property App\\Command::$secondProperty of type int"
        );
    }
}
