//! Handler: fixture_builder
//!
//! Fluent construction of test objects. A builder class declares
//! `@method Target build()` and one `@method self withField($value)` per
//! field of `Target` it wants to expose. `withField` stages a value on the
//! builder instance and returns the builder; `build` creates a `Target`
//! from the staged values, falling back to each field's `@example`.
//!
//! Staged values live in the builder's own [`STAGED_VALUES_FIELD`], so the
//! handler itself stays stateless. An unset (`null`) field counts as
//! nothing staged; any other non-map value is an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use mirage_meta::{example, ClassMetadata, DataType, MetadataError};
use mirage_sdk::{ObjectRef, Value};

use crate::config::HandlerOptions;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::*;

/// Fluent fixture builders, see the module documentation
pub struct FixtureBuilder;

/// Field of a builder instance holding the staged values
pub const STAGED_VALUES_FIELD: &str = "staged_values";

const BUILD_METHOD: &str = "build";
const PREFIX: &str = "with";

static META: HandlerMeta = HandlerMeta {
    id: "fixture_builder",
    description: "Fluent `with*()` / `build()` construction of fixture objects",
};

impl FixtureBuilder {
    /// Metadata of the class `build()` produces, `None` if the builder does
    /// not declare a usable `build()`.
    fn target_class(
        &self,
        builder: &ClassMetadata,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Option<Arc<ClassMetadata>>> {
        let build = match builder.virtual_method(BUILD_METHOD) {
            Some(build) if build.arity() == 0 => build,
            _ => return Ok(None),
        };
        let target = match build.return_type.as_ref().and_then(DataType::class_name) {
            Some(target) => target,
            None => return Ok(None),
        };

        match ctx.metadata.metadata_for(target) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(MetadataError::UnknownClass { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn staged_values(
        &self,
        builder: &ObjectRef,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<BTreeMap<String, Value>> {
        match ctx.reflector.get_field(builder, STAGED_VALUES_FIELD)? {
            Value::Map(staged) => Ok(staged),
            Value::Null => Ok(BTreeMap::new()),
            other => Err(DispatchError::InvalidBuilderState {
                class: builder.class_name(),
                field: STAGED_VALUES_FIELD.to_string(),
                actual: other.type_name(),
            }),
        }
    }

    fn build(
        &self,
        builder: &ObjectRef,
        target: &ClassMetadata,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Value> {
        let mut staged = self.staged_values(builder, ctx)?;
        let scope = target.scope(Some(ctx.metadata.source()));

        let mut values = Vec::with_capacity(target.properties().len());
        for property in target.properties() {
            let value = match (staged.remove(&property.name), &property.example) {
                (Some(value), _) => value,
                (None, Some(expression)) => example::evaluate(expression, &scope, ctx.reflector)?,
                (None, None) => {
                    return Err(DispatchError::MissingDefault {
                        class: property.class.clone(),
                        field: property.name.clone(),
                    })
                }
            };
            values.push((property, value));
        }

        let object = construct_instance(target, values, ctx)?;
        Ok(Value::Object(object))
    }
}

impl CallHandler for FixtureBuilder {
    fn meta(&self) -> &HandlerMeta {
        &META
    }

    fn can_handle(
        &self,
        method: &str,
        class: &ClassMetadata,
        _options: &HandlerOptions,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<bool> {
        let target = match self.target_class(class, ctx)? {
            Some(target) => target,
            None => return Ok(false),
        };
        if method == BUILD_METHOD {
            return Ok(true);
        }

        let declared = match class.virtual_method(method) {
            Some(declared) => declared,
            None => return Ok(false),
        };
        Ok(declared.arity() == 1 && property_name(method, PREFIX, true, &target).is_some())
    }

    fn execute(
        &self,
        receiver: &Receiver,
        method: &str,
        arguments: &[Value],
        class: &ClassMetadata,
        _options: &HandlerOptions,
        ctx: &HandlerContext<'_>,
    ) -> DispatchResult<Value> {
        let builder = require_object(receiver, class, method)?;
        let target = self
            .target_class(class, ctx)?
            .ok_or_else(|| undefined(class, method))?;

        if method == BUILD_METHOD {
            return self.build(builder, &target, ctx);
        }

        let field = property_name(method, PREFIX, true, &target).ok_or_else(|| undefined(class, method))?;
        let mut staged = self.staged_values(builder, ctx)?;
        staged.insert(field, arguments.first().cloned().unwrap_or_default());
        ctx.reflector
            .set_field(builder, STAGED_VALUES_FIELD, Value::Map(staged))?;

        Ok(Value::Object(builder.clone()))
    }
}
