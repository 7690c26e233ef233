//! Built-in call handlers.

pub mod fixture_builder;
pub mod named_constructor;
pub mod virtual_getter;

use std::sync::Arc;

use crate::handler::CallHandler;
use crate::registry::HandlerFactory;

pub use fixture_builder::{FixtureBuilder, STAGED_VALUES_FIELD};
pub use named_constructor::{NamedConstructor, METHOD_NAME_OPTION};
pub use virtual_getter::VirtualGetter;

/// Identifier and factory of every built-in handler.
pub fn builtin_handlers() -> Vec<(&'static str, HandlerFactory)> {
    vec![
        ("virtual_getter", factory(|| VirtualGetter)),
        ("named_constructor", factory(|| NamedConstructor)),
        ("fixture_builder", factory(|| FixtureBuilder)),
    ]
}

fn factory<H>(make: fn() -> H) -> HandlerFactory
where
    H: CallHandler + 'static,
{
    Arc::new(move || Arc::new(make()) as Arc<dyn CallHandler>)
}
