//! Dispatcher - resolves and runs virtual method calls
//!
//! Entry points for a host's "method missing" hooks. For every call the
//! dispatcher:
//!
//! 1. fetches the (cached) metadata of the receiver class
//! 2. walks the handler chain in order and selects the first handler whose
//!    `can_handle` answers true
//! 3. falls back to the static chain registered for the class when an
//!    instance call finds no handler
//! 4. rejects static calls to handlers that need an instance
//! 5. checks the argument count against the declaration
//! 6. executes the handler and checks the result against the declared
//!    return type

use std::sync::Arc;

use dashmap::DashMap;
use mirage_meta::{ClassMetadata, MetadataFactory};
use mirage_sdk::{normalize_class_name, ObjectRef, Reflector, Value};
use tracing::trace;

use crate::config::HandlerSpec;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{undefined, CallHandler, HandlerContext, Receiver};
use crate::registry::HandlerRegistry;

/// Virtual method dispatcher
pub struct Dispatcher {
    metadata: Arc<MetadataFactory>,
    reflector: Arc<dyn Reflector>,
    handlers: HandlerRegistry,
    /// Class name to the chain instance calls fall back to
    static_fallbacks: DashMap<String, Vec<HandlerSpec>>,
}

impl Dispatcher {
    /// Create a dispatcher with the built-in handlers
    pub fn new(metadata: Arc<MetadataFactory>, reflector: Arc<dyn Reflector>) -> Self {
        Self::with_registry(metadata, reflector, HandlerRegistry::with_builtins())
    }

    /// Create a dispatcher with a custom handler registry
    pub fn with_registry(
        metadata: Arc<MetadataFactory>,
        reflector: Arc<dyn Reflector>,
        handlers: HandlerRegistry,
    ) -> Self {
        Self {
            metadata,
            reflector,
            handlers,
            static_fallbacks: DashMap::new(),
        }
    }

    /// Metadata factory used for every call
    pub fn metadata(&self) -> &MetadataFactory {
        &self.metadata
    }

    /// Reflector used for every call
    pub fn reflector(&self) -> &dyn Reflector {
        self.reflector.as_ref()
    }

    /// Handler registry
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Make instance calls on `class_name` that no handler claims fall
    /// back to `chain` as static calls
    pub fn register_static_fallback(&self, class_name: &str, chain: Vec<HandlerSpec>) {
        self.static_fallbacks
            .insert(normalize_class_name(class_name).to_string(), chain);
    }

    /// Stop instance calls on `class_name` from falling back to a static chain
    pub fn remove_static_fallback(&self, class_name: &str) {
        self.static_fallbacks.remove(normalize_class_name(class_name));
    }

    /// Check if a static fallback is registered for a class
    pub fn has_static_fallback(&self, class_name: &str) -> bool {
        self.static_fallbacks
            .contains_key(normalize_class_name(class_name))
    }

    /// Dispatch a call on an instance
    pub fn invoke(
        &self,
        receiver: &ObjectRef,
        method: &str,
        arguments: &[Value],
        chain: &[HandlerSpec],
    ) -> DispatchResult<Value> {
        let class_name = receiver.class_name();
        let class = self.metadata.metadata_for(&class_name)?;

        if let Some((handler, spec)) = self.select(method, &class, chain)? {
            return self.run(
                Receiver::Object(receiver.clone()),
                method,
                arguments,
                &class,
                handler.as_ref(),
                spec,
            );
        }

        let fallback = self
            .static_fallbacks
            .get(class.name())
            .map(|entry| entry.value().clone());
        if let Some(fallback) = fallback {
            trace!(class = class.name(), method, "falling back to static handlers");
            return self.invoke_statically(class.name(), method, arguments, &fallback);
        }

        Err(undefined(&class, method))
    }

    /// Dispatch a call on a class
    pub fn invoke_statically(
        &self,
        class_name: &str,
        method: &str,
        arguments: &[Value],
        chain: &[HandlerSpec],
    ) -> DispatchResult<Value> {
        let class = self.metadata.metadata_for(class_name)?;

        match self.select(method, &class, chain)? {
            Some((handler, spec)) => self.run(
                Receiver::Class(class.name().to_string()),
                method,
                arguments,
                &class,
                handler.as_ref(),
                spec,
            ),
            None => Err(undefined(&class, method)),
        }
    }

    fn context(&self) -> HandlerContext<'_> {
        HandlerContext {
            metadata: &self.metadata,
            reflector: self.reflector.as_ref(),
        }
    }

    /// First handler of the chain that claims the call
    fn select<'c>(
        &self,
        method: &str,
        class: &ClassMetadata,
        chain: &'c [HandlerSpec],
    ) -> DispatchResult<Option<(Arc<dyn CallHandler>, &'c HandlerSpec)>> {
        let ctx = self.context();
        for spec in chain {
            let handler = self.handlers.resolve(&spec.handler)?;
            if handler.can_handle(method, class, &spec.options, &ctx)? {
                trace!(
                    class = class.name(),
                    method,
                    handler = handler.meta().id,
                    "selected call handler"
                );
                return Ok(Some((handler, spec)));
            }
        }
        Ok(None)
    }

    fn run(
        &self,
        receiver: Receiver,
        method: &str,
        arguments: &[Value],
        class: &ClassMetadata,
        handler: &dyn CallHandler,
        spec: &HandlerSpec,
    ) -> DispatchResult<Value> {
        if receiver.is_static() && handler.requires_object_context() {
            return Err(DispatchError::InvalidStaticContext {
                class: class.name().to_string(),
                method: method.to_string(),
            });
        }

        // Handlers may claim methods that were never declared; those have
        // nothing to check arguments or results against.
        let declared = class.virtual_method(method);

        if let Some(declared) = declared {
            if arguments.len() != declared.arity() {
                return Err(DispatchError::ArityMismatch {
                    class: class.name().to_string(),
                    method: method.to_string(),
                    passed: arguments.len(),
                    expected: declared.arity(),
                });
            }
        }

        let ctx = self.context();
        let result = handler.execute(&receiver, method, arguments, class, &spec.options, &ctx)?;

        if let Some(expected) = declared.and_then(|declared| declared.return_type.as_ref()) {
            if !expected.accepts(&result, &ctx.type_context(class.name())) {
                return Err(DispatchError::ReturnTypeMismatch {
                    class: class.name().to_string(),
                    method: method.to_string(),
                    expected: expected.to_string(),
                    actual: result.type_name(),
                });
            }
        }

        Ok(result)
    }
}
