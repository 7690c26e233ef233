//! Metadata factory
//!
//! Builds [`ClassMetadata`] from a class declaration the first time a class
//! is asked for, and hands out the same `Arc` on every later request.
//! Declarations are immutable once loaded, so entries are never evicted.
//! Two threads racing on the first request may both build the metadata;
//! the first insertion wins and both get the cached instance.

use std::sync::Arc;

use dashmap::DashMap;
use mirage_sdk::{normalize_class_name, ClassDeclaration, DeclarationSource};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::docblock::DocBlock;
use crate::error::{MetadataError, MetadataResult};
use crate::metadata::{
    ClassMetadata, ParameterMetadata, PropertyMetadata, VirtualMethodMetadata,
    VirtualPropertyMetadata,
};
use crate::signature::{self, SignatureError};
use crate::types::{DataType, TypeScope};

/// Memoizing builder of class metadata
pub struct MetadataFactory {
    /// Where declarations come from
    source: Arc<dyn DeclarationSource>,
    /// Class name to built metadata
    cache: DashMap<String, Arc<ClassMetadata>>,
}

impl MetadataFactory {
    /// Create a factory with an empty cache
    pub fn new(source: Arc<dyn DeclarationSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
        }
    }

    /// Get the metadata of a class, building it on first access
    pub fn metadata_for(&self, class_name: &str) -> MetadataResult<Arc<ClassMetadata>> {
        let class_name = normalize_class_name(class_name);

        if let Some(entry) = self.cache.get(class_name) {
            trace!(class = class_name, "metadata cache hit");
            return Ok(Arc::clone(entry.value()));
        }

        let declaration =
            self.source
                .declaration(class_name)
                .ok_or_else(|| MetadataError::UnknownClass {
                    class: class_name.to_string(),
                })?;
        let metadata = Arc::new(build_metadata(&declaration, Some(self.source.as_ref()))?);

        debug!(
            class = class_name,
            virtual_methods = metadata.virtual_methods().len(),
            fields = metadata.properties().len(),
            "built class metadata"
        );

        let entry = self
            .cache
            .entry(class_name.to_string())
            .or_insert(metadata);
        Ok(Arc::clone(entry.value()))
    }

    /// Check if metadata for a class has been built
    pub fn is_cached(&self, class_name: &str) -> bool {
        self.cache.contains_key(normalize_class_name(class_name))
    }

    /// Number of cached classes
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Declaration source backing this factory
    pub fn source(&self) -> &dyn DeclarationSource {
        self.source.as_ref()
    }
}

/// Build metadata from a single declaration without caching it.
///
/// `source` is used to resolve unqualified names to classes of the same
/// namespace.
pub fn build_metadata(
    declaration: &ClassDeclaration,
    source: Option<&dyn DeclarationSource>,
) -> MetadataResult<ClassMetadata> {
    let class = declaration.name.as_str();
    let scope = TypeScope::new(
        class,
        &declaration.namespace,
        &declaration.use_statements,
        source,
    );
    let mut metadata = ClassMetadata::new(
        class,
        declaration.namespace.clone(),
        declaration.use_statements.clone(),
    );

    let doc = DocBlock::parse(&declaration.doc_comment);

    for tag in doc.tags_named("method") {
        let method = build_method(&tag.body, &scope)?;
        metadata.add_virtual_method(method);
    }

    for tag in doc.tags_named("property-read") {
        let property = signature::parse_property_read(&tag.body)
            .map_err(|err| invalid_signature(class, "property-read", err))?;
        let data_type = parse_optional_type(property.type_expr.as_deref(), &scope)?;
        metadata.add_virtual_property(VirtualPropertyMetadata {
            class: class.to_string(),
            name: property.name,
            data_type,
        });
    }

    for field in &declaration.fields {
        let field_doc = DocBlock::parse(&field.doc_comment);
        let type_expr = field_doc
            .first("var")
            .and_then(|tag| signature::parse_var(&tag.body));
        let example = field_doc
            .first("example")
            .map(|tag| tag.body.clone())
            .filter(|body| !body.is_empty());

        metadata.add_property(PropertyMetadata {
            class: class.to_string(),
            name: field.name.clone(),
            data_type: parse_optional_type(type_expr, &scope)?,
            example,
        });
    }

    Ok(metadata)
}

fn build_method(body: &str, scope: &TypeScope<'_>) -> MetadataResult<VirtualMethodMetadata> {
    let class = scope.class_name();
    let signature = signature::parse_method(body).map_err(|err| match err {
        SignatureError::DefaultValue { method, parameter } => MetadataError::UnsupportedDeclaration {
            class: class.to_string(),
            method,
            parameter,
        },
        other => invalid_signature(class, "method", other),
    })?;

    let mut seen = FxHashSet::default();
    let mut parameters = Vec::with_capacity(signature.parameters.len());
    for parameter in signature.parameters {
        if !seen.insert(parameter.name.clone()) {
            return Err(MetadataError::InvalidSignature {
                class: class.to_string(),
                tag: "method".to_string(),
                message: format!(
                    "duplicate parameter ${} in {}()",
                    parameter.name, signature.name
                ),
            });
        }
        parameters.push(ParameterMetadata {
            data_type: parse_optional_type(parameter.type_expr.as_deref(), scope)?,
            name: parameter.name,
        });
    }

    let return_type = signature
        .return_type
        .as_deref()
        .map(|expr| DataType::parse(expr, scope))
        .transpose()?;

    Ok(VirtualMethodMetadata {
        class: class.to_string(),
        name: signature.name,
        parameters,
        is_static: signature.is_static,
        return_type,
    })
}

fn parse_optional_type(expr: Option<&str>, scope: &TypeScope<'_>) -> MetadataResult<DataType> {
    match expr {
        Some(expr) => DataType::parse(expr, scope),
        None => Ok(DataType::Untyped),
    }
}

fn invalid_signature(class: &str, tag: &str, err: SignatureError) -> MetadataError {
    MetadataError::InvalidSignature {
        class: class.to_string(),
        tag: tag.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Primitive;

    #[test]
    fn test_build_metadata_without_source() {
        let declaration = ClassDeclaration::new("App\\Point")
            .with_doc("/** @method int x() */")
            .with_field("x", "/** @var int\n * @example 3 */");

        let metadata = build_metadata(&declaration, None).unwrap();

        let method = metadata.virtual_method("x").unwrap();
        assert_eq!(method.return_type, Some(DataType::Primitive(Primitive::Int)));
        let field = metadata.property("x").unwrap();
        assert_eq!(field.example.as_deref(), Some("3"));
    }

    #[test]
    fn test_static_as_leading_return_type() {
        let declaration = ClassDeclaration::new("App\\Repository").with_doc(
            "/**
              * @method static|null find()
              * @method static[] all()
              */",
        );

        let metadata = build_metadata(&declaration, None).unwrap();

        let find = metadata.virtual_method("find").unwrap();
        assert!(!find.is_static);
        assert_eq!(
            find.return_type,
            Some(DataType::Union(vec![
                DataType::StaticType,
                DataType::Primitive(Primitive::Null)
            ]))
        );
        let all = metadata.virtual_method("all").unwrap();
        assert_eq!(all.return_type, Some(DataType::Array(Box::new(DataType::StaticType))));
    }

    #[test]
    fn test_duplicate_parameters_rejected() {
        let declaration =
            ClassDeclaration::new("App\\Point").with_doc("/** @method static self of(int $x, int $x) */");

        let err = build_metadata(&declaration, None).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidSignature { .. }));
    }
}
