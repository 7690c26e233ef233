//! Handler: virtual_getter
//!
//! Serves declared zero-argument accessors that return the current value
//! of a field, either named like the field (`email()`) or with a `get`
//! prefix (`getEmail()`).

use mirage_meta::ClassMetadata;
use mirage_sdk::Value;

use crate::config::HandlerOptions;
use crate::error::DispatchResult;
use crate::handler::*;

/// Field accessors, see the module documentation
pub struct VirtualGetter;

static META: HandlerMeta = HandlerMeta {
    id: "virtual_getter",
    description: "Read-only accessors backed by a field, optionally prefixed with `get`",
};

const PREFIX: &str = "get";

impl CallHandler for VirtualGetter {
    fn meta(&self) -> &HandlerMeta {
        &META
    }

    fn can_handle(
        &self,
        method: &str,
        class: &ClassMetadata,
        _options: &HandlerOptions,
        _ctx: &HandlerContext<'_>,
    ) -> DispatchResult<bool> {
        let declared = match class.virtual_method(method) {
            Some(declared) => declared,
            None => return Ok(false),
        };

        Ok(declared.arity() == 0 && property_name(method, PREFIX, false, class).is_some())
    }

    fn execute(
        &self,
        receiver: &Receiver,
        method: &str,
        _arguments: &[Value],
        class: &ClassMetadata,
        _options: &HandlerOptions,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Value> {
        let object = require_object(receiver, class, method)?;
        let field = property_name(method, PREFIX, false, class).ok_or_else(|| undefined(class, method))?;

        Ok(ctx.reflector.get_field(object, &field)?)
    }
}
