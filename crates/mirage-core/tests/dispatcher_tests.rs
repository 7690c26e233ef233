//! Dispatcher tests
//!
//! Full calls through the runtime: handler selection, declaration checks
//! and error reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mirage_core::{
    CallHandler, ClassDef, ClassHooks, DispatchError, DispatchResult, HandlerContext,
    HandlerMeta, HandlerOptions, HandlerRegistry, HandlerSpec, Mixin, Receiver, Runtime,
};
use mirage_meta::ClassMetadata;
use mirage_sdk::{ObjectRef, Value};

const USER: &str = "App\\Model\\User";

fn user_runtime() -> Runtime {
    let runtime = Runtime::new();
    runtime
        .define_with(
            ClassDef::new(USER)
                .doc(
                    "/**
                      * @method string getName()
                      * @method int age()
                      * @method string getAge()
                      * @method string describe()
                      */",
                )
                .field("name", "/** @var string */")
                .field("age", "/** @var int */"),
            Mixin::Entity,
        )
        .unwrap();
    runtime
}

fn user(runtime: &Runtime, name: &str, age: i64) -> ObjectRef {
    let object = runtime.instantiate(USER).unwrap();
    {
        let mut instance = object.write();
        instance.set("name", Value::from(name));
        instance.set("age", Value::from(age));
    }
    object
}

#[test]
fn test_getter_returns_field_value() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);

    assert_eq!(runtime.call(&alice, "getName", &[]).unwrap(), Value::from("Alice"));
    assert_eq!(runtime.call(&alice, "age", &[]).unwrap(), Value::from(30));
}

#[test]
fn test_getter_sees_later_changes() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);
    alice.write().set("age", Value::from(31));

    assert_eq!(runtime.call(&alice, "age", &[]).unwrap(), Value::from(31));
}

#[test]
fn test_too_many_arguments() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);

    let err = runtime.call(&alice, "getName", &[Value::from(1)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Too many arguments to function App\\Model\\User::getName(), 1 passed and exactly 0 expected"
    );
}

#[test]
fn test_return_type_mismatch() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);

    let err = runtime.call(&alice, "getAge", &[]).unwrap_err();
    assert_eq!(
        err,
        DispatchError::ReturnTypeMismatch {
            class: USER.to_string(),
            method: "getAge".to_string(),
            expected: "string".to_string(),
            actual: "int".to_string(),
        }
    );
}

#[test]
fn test_declared_method_without_handler() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);

    let err = runtime.call(&alice, "describe", &[]).unwrap_err();
    assert_eq!(err.to_string(), "Call to undefined method App\\Model\\User::describe()");
}

#[test]
fn test_undeclared_method() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);

    let err = runtime.call(&alice, "getEmail", &[]).unwrap_err();
    assert_eq!(
        err,
        DispatchError::UndefinedMethod {
            class: USER.to_string(),
            method: "getEmail".to_string(),
        }
    );
}

#[test]
fn test_class_without_hooks() {
    let runtime = Runtime::new();
    runtime
        .define(
            ClassDef::new("App\\Plain")
                .doc("/** @method int value() */")
                .field("value", "/** @var int */"),
        )
        .unwrap();
    let object = runtime.instantiate("App\\Plain").unwrap();

    assert!(matches!(
        runtime.call(&object, "value", &[]),
        Err(DispatchError::UndefinedMethod { .. })
    ));
}

#[test]
fn test_static_call_to_instance_handler() {
    let runtime = user_runtime();
    let chain = vec![HandlerSpec::new("virtual_getter")];

    let err = runtime
        .dispatcher()
        .invoke_statically(USER, "getName", &[], &chain)
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::InvalidStaticContext {
            class: USER.to_string(),
            method: "getName".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Calling a non-static method when not in object context."
    );
}

#[test]
fn test_unknown_class() {
    let runtime = Runtime::new();
    assert!(matches!(
        runtime.call_static("App\\Missing", "create", &[]),
        Err(DispatchError::Metadata(_))
    ));
}

#[test]
fn test_unknown_handler_in_chain() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);
    let chain = vec![HandlerSpec::new("no_such_handler")];

    let err = runtime
        .dispatcher()
        .invoke(&alice, "getName", &[], &chain)
        .unwrap_err();
    assert_eq!(err, DispatchError::UnknownHandler("no_such_handler".to_string()));
}

#[test]
fn test_instance_call_falls_back_to_static_chain() {
    let runtime = Runtime::new();
    runtime
        .define_with(
            ClassDef::new("App\\Command\\Rename")
                .doc(
                    "/**
                      * @method static self instruct(string $name)
                      * @method string name()
                      */",
                )
                .field("name", "/** @var string */"),
            Mixin::command(),
        )
        .unwrap();
    let existing = runtime.instantiate("App\\Command\\Rename").unwrap();

    let created = runtime.call(&existing, "instruct", &[Value::from("Bob")]).unwrap();
    let created = created.as_object().unwrap();

    assert!(!created.ptr_eq(&existing));
    assert_eq!(runtime.call(created, "name", &[]).unwrap(), Value::from("Bob"));
    assert!(runtime.dispatcher().has_static_fallback("App\\Command\\Rename"));
}

/// Claims one method, declared or not, and counts its calls
struct Echo {
    method: &'static str,
    calls: Arc<AtomicUsize>,
}

static ECHO_META: HandlerMeta = HandlerMeta {
    id: "echo",
    description: "Returns its arguments as a list",
};

impl CallHandler for Echo {
    fn meta(&self) -> &HandlerMeta {
        &ECHO_META
    }

    fn requires_object_context(&self) -> bool {
        false
    }

    fn can_handle(
        &self,
        method: &str,
        _class: &ClassMetadata,
        _options: &HandlerOptions,
        _ctx: &HandlerContext<'_>,
    ) -> DispatchResult<bool> {
        Ok(method == self.method)
    }

    fn execute(
        &self,
        _receiver: &Receiver,
        _method: &str,
        arguments: &[Value],
        _class: &ClassMetadata,
        _options: &HandlerOptions,
        _ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::List(arguments.to_vec()))
    }
}

fn runtime_with_echo(method: &'static str, calls: Arc<AtomicUsize>) -> Runtime {
    let handlers = HandlerRegistry::with_builtins();
    handlers.register("echo", move || {
        Arc::new(Echo {
            method,
            calls: calls.clone(),
        }) as Arc<dyn CallHandler>
    });
    let runtime = Runtime::with_handlers(handlers);
    runtime
        .define(
            ClassDef::new(USER)
                .doc("/** @method string getName() */")
                .field("name", "/** @var string */"),
        )
        .unwrap();
    runtime
}

#[test]
fn test_custom_handler_for_undeclared_method() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runtime = runtime_with_echo("ping", calls.clone());
    runtime.set_hooks(
        USER,
        ClassHooks {
            instance: vec![HandlerSpec::new("echo")],
            statics: Vec::new(),
        },
    );
    let object = runtime.instantiate(USER).unwrap();

    // Nothing declared, so any number of arguments and any result pass.
    let result = runtime
        .call(&object, "ping", &[Value::from(1), Value::from("two")])
        .unwrap();
    assert_eq!(result, Value::List(vec![Value::from(1), Value::from("two")]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_first_matching_handler_wins() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runtime = runtime_with_echo("getName", calls.clone());
    let object = runtime.instantiate(USER).unwrap();
    object.write().set("name", Value::from("Alice"));

    let getter_first = vec![HandlerSpec::new("virtual_getter"), HandlerSpec::new("echo")];
    let result = runtime
        .dispatcher()
        .invoke(&object, "getName", &[], &getter_first)
        .unwrap();
    assert_eq!(result, Value::from("Alice"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The echo result is a list, which the declared return type rejects.
    let echo_first = vec![HandlerSpec::new("echo"), HandlerSpec::new("virtual_getter")];
    let err = runtime
        .dispatcher()
        .invoke(&object, "getName", &[], &echo_first)
        .unwrap_err();
    assert!(matches!(err, DispatchError::ReturnTypeMismatch { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handlers_are_instantiated_once() {
    let runtime = user_runtime();
    let alice = user(&runtime, "Alice", 30);

    for _ in 0..3 {
        runtime.call(&alice, "getName", &[]).unwrap();
    }
    assert_eq!(runtime.dispatcher().handlers().instance_count(), 1);
    assert!(runtime.dispatcher().metadata().is_cached(USER));
}
