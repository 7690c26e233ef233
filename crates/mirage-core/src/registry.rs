//! Handler registry
//!
//! Maps handler identifiers to factories and keeps one long-lived instance
//! per identifier, created the first time a chain names it.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};
use crate::handler::CallHandler;
use crate::handlers::builtin_handlers;

/// Creates a handler instance
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn CallHandler> + Send + Sync>;

/// Registry of call handlers
pub struct HandlerRegistry {
    /// Identifier to factory
    factories: RwLock<FxHashMap<String, HandlerFactory>>,
    /// Identifier to the instance in use
    instances: DashMap<String, Arc<dyn CallHandler>>,
}

impl HandlerRegistry {
    /// Create a registry without any handler
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(FxHashMap::default()),
            instances: DashMap::new(),
        }
    }

    /// Create a registry with the built-in handlers
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut factories = registry.factories.write();
            for (id, factory) in builtin_handlers() {
                factories.insert(id.to_string(), factory);
            }
        }
        registry
    }

    /// Register a handler factory, replacing any previous one for `id`
    pub fn register<F>(&self, id: &str, factory: F)
    where
        F: Fn() -> Arc<dyn CallHandler> + Send + Sync + 'static,
    {
        self.factories.write().insert(id.to_string(), Arc::new(factory));
        self.instances.remove(id);
    }

    /// Get the handler instance for `id`, creating it on first use
    pub fn resolve(&self, id: &str) -> DispatchResult<Arc<dyn CallHandler>> {
        if let Some(instance) = self.instances.get(id) {
            return Ok(Arc::clone(instance.value()));
        }

        let factory = self
            .factories
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownHandler(id.to_string()))?;

        let instance = factory();
        debug!(handler = id, "instantiated call handler");

        let entry = self.instances.entry(id.to_string()).or_insert(instance);
        Ok(Arc::clone(entry.value()))
    }

    /// Check if a factory is registered for `id`
    pub fn is_registered(&self, id: &str) -> bool {
        self.factories.read().contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn handler_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of handlers instantiated so far
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
