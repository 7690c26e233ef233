//! Integration tests for metadata extraction and caching

use std::sync::Arc;

use mirage_meta::{DataType, MetadataError, MetadataFactory, Primitive};
use mirage_sdk::{ClassDeclaration, DeclarationSource};
use rustc_hash::FxHashMap;

struct Declarations(FxHashMap<String, ClassDeclaration>);

impl Declarations {
    fn new(declarations: Vec<ClassDeclaration>) -> Arc<Self> {
        Arc::new(Self(
            declarations
                .into_iter()
                .map(|decl| (decl.name.clone(), decl))
                .collect(),
        ))
    }
}

impl DeclarationSource for Declarations {
    fn declaration(&self, class_name: &str) -> Option<ClassDeclaration> {
        self.0.get(class_name).cloned()
    }
}

fn register_command() -> ClassDeclaration {
    ClassDeclaration::new("App\\Command\\Register")
        .with_use("App\\Model\\User")
        .with_use_as("Lib\\Time\\Clock", "Time")
        .with_doc(
            "/**
              * Registers a user.
              *
              * @method static self instruct(string $email, User $referrer, Time $at)
              * @method string email()
              * @method User getReferrer()
              * @property-read string $email
              */",
        )
        .with_field("email", "/** @var string */")
        .with_field("referrer", "/** @var User */")
        .with_field("at", "/** @var Time */")
}

fn factory() -> MetadataFactory {
    MetadataFactory::new(Declarations::new(vec![
        register_command(),
        ClassDeclaration::new("App\\Command\\Address"),
        ClassDeclaration::new("App\\Command\\WithAddress")
            .with_field("address", "/** @var Address */")
            .with_field("untyped", ""),
        ClassDeclaration::new("App\\Broken")
            .with_doc("/** @method static self create(string $name, int $age = 42) */"),
        ClassDeclaration::new("App\\Malformed").with_doc("/** @method int count(int $a */"),
    ]))
}

#[test]
fn test_virtual_methods_are_extracted() {
    let factory = factory();
    let metadata = factory.metadata_for("App\\Command\\Register").unwrap();

    assert_eq!(metadata.name(), "App\\Command\\Register");
    assert_eq!(metadata.namespace(), "App\\Command");
    assert_eq!(metadata.virtual_methods().len(), 3);

    let instruct = metadata.virtual_method("instruct").unwrap();
    assert!(instruct.is_static);
    assert_eq!(instruct.return_type, Some(DataType::SelfType));
    let params: Vec<_> = instruct
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.data_type.to_string()))
        .collect();
    assert_eq!(
        params,
        vec![
            ("email", "string".to_string()),
            ("referrer", "App\\Model\\User".to_string()),
            ("at", "Lib\\Time\\Clock".to_string()),
        ]
    );

    let getter = metadata.virtual_method("getReferrer").unwrap();
    assert_eq!(
        getter.return_type,
        Some(DataType::Class("App\\Model\\User".to_string()))
    );
    assert!(getter.parameters.is_empty());
}

#[test]
fn test_fields_keep_declaration_order_and_types() {
    let factory = factory();
    let metadata = factory.metadata_for("App\\Command\\Register").unwrap();

    assert_eq!(
        metadata.property_names().collect::<Vec<_>>(),
        vec!["email", "referrer", "at"]
    );
    assert_eq!(
        metadata.property("email").unwrap().data_type,
        DataType::Primitive(Primitive::String)
    );
    assert_eq!(metadata.virtual_properties().len(), 1);
    assert_eq!(metadata.virtual_properties()[0].name, "email");
    assert_eq!(
        metadata.virtual_property("email").unwrap().data_type,
        DataType::Primitive(Primitive::String)
    );
    assert!(metadata.virtual_property("referrer").is_none());
}

#[test]
fn test_in_namespace_classes_resolve_through_source() {
    let factory = factory();
    let metadata = factory.metadata_for("App\\Command\\WithAddress").unwrap();

    assert_eq!(
        metadata.property("address").unwrap().data_type,
        DataType::Class("App\\Command\\Address".to_string())
    );
    assert_eq!(metadata.property("untyped").unwrap().data_type, DataType::Untyped);
}

#[test]
fn test_default_values_are_rejected() {
    let factory = factory();
    let err = factory.metadata_for("App\\Broken").unwrap_err();

    assert_eq!(
        err,
        MetadataError::UnsupportedDeclaration {
            class: "App\\Broken".to_string(),
            method: "create".to_string(),
            parameter: "age".to_string(),
        }
    );
    assert!(!factory.is_cached("App\\Broken"));
}

#[test]
fn test_malformed_declarations_are_reported() {
    let factory = factory();
    let err = factory.metadata_for("App\\Malformed").unwrap_err();
    assert!(matches!(err, MetadataError::InvalidSignature { ref tag, .. } if tag == "method"));
}

#[test]
fn test_unknown_class() {
    let factory = factory();
    let err = factory.metadata_for("App\\Nope").unwrap_err();
    assert_eq!(err.to_string(), "Class \"App\\Nope\" does not exist");
}

#[test]
fn test_metadata_is_cached() {
    let factory = factory();
    assert!(factory.is_empty());

    let first = factory.metadata_for("App\\Command\\Register").unwrap();
    let second = factory.metadata_for("\\App\\Command\\Register").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
    assert_eq!(factory.len(), 1);
    assert!(factory.is_cached("App\\Command\\Register"));
}

#[test]
fn test_fresh_factories_build_equal_metadata() {
    let first = factory().metadata_for("App\\Command\\Register").unwrap();
    let second = factory().metadata_for("App\\Command\\Register").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_first_access() {
    let factory = Arc::new(factory());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let factory = Arc::clone(&factory);
            std::thread::spawn(move || factory.metadata_for("App\\Command\\Register").unwrap())
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for metadata in &results[1..] {
        assert_eq!(**metadata, *results[0]);
    }
    assert_eq!(factory.len(), 1);
}
