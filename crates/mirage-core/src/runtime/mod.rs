//! In-memory object runtime
//!
//! Plays the part of the host: it owns class definitions, allocates
//! instances and routes calls to methods a class does not implement into
//! the [`Dispatcher`], using the hook chains configured per class.

pub mod class_registry;

pub use class_registry::{ClassDef, ClassRegistry, FieldDef};

use std::sync::Arc;

use dashmap::DashMap;
use mirage_meta::MetadataFactory;
use mirage_sdk::{normalize_class_name, ObjectRef, Reflector, Value};

use crate::config::{ClassHooks, HooksConfig};
use crate::dispatcher::Dispatcher;
use crate::error::DispatchResult;
use crate::handlers::STAGED_VALUES_FIELD;
use crate::mixins::Mixin;
use crate::registry::HandlerRegistry;

/// Object runtime with virtual method dispatch
pub struct Runtime {
    classes: Arc<ClassRegistry>,
    dispatcher: Dispatcher,
    /// Class name to hooks; inherited hooks are copied here on first use
    hooks: DashMap<String, ClassHooks>,
}

impl Runtime {
    /// Create a runtime with the built-in handlers
    pub fn new() -> Self {
        Self::with_handlers(HandlerRegistry::with_builtins())
    }

    /// Create a runtime with a custom handler registry
    pub fn with_handlers(handlers: HandlerRegistry) -> Self {
        let classes = Arc::new(ClassRegistry::new());
        let metadata = Arc::new(MetadataFactory::new(classes.clone()));
        let dispatcher = Dispatcher::with_registry(metadata, classes.clone(), handlers);
        Self {
            classes,
            dispatcher,
            hooks: DashMap::new(),
        }
    }

    /// Class definitions
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Define a class without hooks
    pub fn define(&self, class: ClassDef) -> DispatchResult<()> {
        self.classes.register(class)
    }

    /// Define a class using a mixin preset
    pub fn define_with(&self, class: ClassDef, mixin: Mixin) -> DispatchResult<()> {
        let class = mixin.prepare(class);
        let name = class.name.clone();
        self.define(class)?;
        self.set_hooks(&name, mixin.hooks());
        Ok(())
    }

    /// Install the hooks of a class, replacing any previous ones. A
    /// non-empty static chain also becomes the fallback of instance calls no
    /// instance handler claims.
    pub fn set_hooks(&self, class_name: &str, hooks: ClassHooks) {
        let class_name = normalize_class_name(class_name);
        if hooks.statics.is_empty() {
            self.dispatcher.remove_static_fallback(class_name);
        } else {
            self.dispatcher
                .register_static_fallback(class_name, hooks.statics.clone());
        }
        self.hooks.insert(class_name.to_string(), hooks);
    }

    /// Install the hooks of every class in `config`
    pub fn apply_config(&self, config: &HooksConfig) {
        for (class_name, hooks) in &config.classes {
            self.set_hooks(class_name, hooks.clone());
        }
    }

    /// Hooks of a class, inherited from the nearest ancestor that has some
    pub fn hooks_for(&self, class_name: &str) -> Option<ClassHooks> {
        let class_name = normalize_class_name(class_name);
        if let Some(hooks) = self.hooks.get(class_name) {
            return Some(hooks.value().clone());
        }

        let inherited = self
            .classes
            .hierarchy(class_name)
            .iter()
            .skip(1)
            .find_map(|ancestor| self.hooks.get(&ancestor.name).map(|hooks| hooks.value().clone()))?;
        self.set_hooks(class_name, inherited.clone());
        Some(inherited)
    }

    /// Allocate an instance with default field values
    pub fn instantiate(&self, class_name: &str) -> DispatchResult<ObjectRef> {
        Ok(self.classes.allocate(class_name)?)
    }

    /// Create a fresh fixture builder with nothing staged
    pub fn configure(&self, builder_class: &str) -> DispatchResult<ObjectRef> {
        let builder = self.instantiate(builder_class)?;
        self.classes
            .set_field(&builder, STAGED_VALUES_FIELD, Value::Map(Default::default()))?;
        Ok(builder)
    }

    /// Call a method the class of `object` does not implement
    pub fn call(&self, object: &ObjectRef, method: &str, arguments: &[Value]) -> DispatchResult<Value> {
        let hooks = self.hooks_for(&object.class_name()).unwrap_or_default();
        self.dispatcher.invoke(object, method, arguments, &hooks.instance)
    }

    /// Call a static method `class_name` does not implement
    pub fn call_static(&self, class_name: &str, method: &str, arguments: &[Value]) -> DispatchResult<Value> {
        let hooks = self.hooks_for(class_name).unwrap_or_default();
        self.dispatcher
            .invoke_statically(class_name, method, arguments, &hooks.statics)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
