//! Class metadata model
//!
//! Immutable description of a class as far as virtual method dispatch is
//! concerned: its real fields with their declared types and examples, the
//! virtual methods declared through `@method`, and informational
//! `@property-read` entries.

use mirage_sdk::DeclarationSource;
use rustc_hash::FxHashMap;

use crate::types::{DataType, TypeScope};

/// Declared field of a class
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMetadata {
    /// Declaring class
    pub class: String,
    /// Field name
    pub name: String,
    /// Type from the `@var` tag, `Untyped` if absent
    pub data_type: DataType,
    /// Raw `@example` expression, if any
    pub example: Option<String>,
}

/// Parameter of a virtual method
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    /// Parameter name without `$`
    pub name: String,
    /// Declared type, `Untyped` if absent
    pub data_type: DataType,
}

/// Virtual method declared through `@method`
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualMethodMetadata {
    /// Declaring class
    pub class: String,
    /// Method name
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterMetadata>,
    /// Whether the declaration is marked `static`
    pub is_static: bool,
    /// Declared return type, `None` when none is declared
    pub return_type: Option<DataType>,
}

impl VirtualMethodMetadata {
    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// Read-only virtual property declared through `@property-read`
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualPropertyMetadata {
    /// Declaring class
    pub class: String,
    /// Property name
    pub name: String,
    /// Declared type, `Untyped` if absent
    pub data_type: DataType,
}

/// Metadata for a single class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    name: String,
    namespace: String,
    use_statements: FxHashMap<String, String>,

    /// Fields in declaration order
    properties: Vec<PropertyMetadata>,
    /// Field name to index in `properties`
    property_indices: FxHashMap<String, usize>,

    /// Virtual methods in declaration order
    virtual_methods: Vec<VirtualMethodMetadata>,
    /// Method name to index in `virtual_methods`
    method_indices: FxHashMap<String, usize>,

    virtual_properties: Vec<VirtualPropertyMetadata>,
}

impl ClassMetadata {
    /// Create empty metadata for a class
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        use_statements: FxHashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            use_statements,
            properties: Vec::new(),
            property_indices: FxHashMap::default(),
            virtual_methods: Vec::new(),
            method_indices: FxHashMap::default(),
            virtual_properties: Vec::new(),
        }
    }

    /// Fully-qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the class
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Use statements: alias to fully-qualified name
    pub fn use_statements(&self) -> &FxHashMap<String, String> {
        &self.use_statements
    }

    /// Add a field; a field with the same name is replaced in place
    pub fn add_property(&mut self, property: PropertyMetadata) {
        match self.property_indices.get(&property.name) {
            Some(&index) => self.properties[index] = property,
            None => {
                self.property_indices
                    .insert(property.name.clone(), self.properties.len());
                self.properties.push(property);
            }
        }
    }

    /// Add a virtual method; a later declaration of the same name wins
    pub fn add_virtual_method(&mut self, method: VirtualMethodMetadata) {
        match self.method_indices.get(&method.name) {
            Some(&index) => self.virtual_methods[index] = method,
            None => {
                self.method_indices
                    .insert(method.name.clone(), self.virtual_methods.len());
                self.virtual_methods.push(method);
            }
        }
    }

    /// Add a virtual property
    pub fn add_virtual_property(&mut self, property: VirtualPropertyMetadata) {
        self.virtual_properties.push(property);
    }

    /// Get field metadata by name
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.property_indices
            .get(name)
            .map(|&index| &self.properties[index])
    }

    /// Check if a field exists
    pub fn has_property(&self, name: &str) -> bool {
        self.property_indices.contains_key(name)
    }

    /// Fields in declaration order
    pub fn properties(&self) -> &[PropertyMetadata] {
        &self.properties
    }

    /// Field names in declaration order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|property| property.name.as_str())
    }

    /// Get virtual method metadata by name
    pub fn virtual_method(&self, name: &str) -> Option<&VirtualMethodMetadata> {
        self.method_indices
            .get(name)
            .map(|&index| &self.virtual_methods[index])
    }

    /// Check if a virtual method is declared
    pub fn has_virtual_method(&self, name: &str) -> bool {
        self.method_indices.contains_key(name)
    }

    /// Virtual methods in declaration order
    pub fn virtual_methods(&self) -> &[VirtualMethodMetadata] {
        &self.virtual_methods
    }

    /// Virtual properties in declaration order
    pub fn virtual_properties(&self) -> &[VirtualPropertyMetadata] {
        &self.virtual_properties
    }

    /// Get a virtual property by name
    pub fn virtual_property(&self, name: &str) -> Option<&VirtualPropertyMetadata> {
        self.virtual_properties
            .iter()
            .find(|property| property.name == name)
    }

    /// Name-resolution scope of this class
    pub fn scope<'a>(&'a self, source: Option<&'a dyn DeclarationSource>) -> TypeScope<'a> {
        TypeScope::new(&self.name, &self.namespace, &self.use_statements, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Primitive;

    fn property(name: &str, data_type: DataType) -> PropertyMetadata {
        PropertyMetadata {
            class: "App\\Point".to_string(),
            name: name.to_string(),
            data_type,
            example: None,
        }
    }

    fn getter(name: &str) -> VirtualMethodMetadata {
        VirtualMethodMetadata {
            class: "App\\Point".to_string(),
            name: name.to_string(),
            parameters: Vec::new(),
            is_static: false,
            return_type: Some(DataType::Primitive(Primitive::Int)),
        }
    }

    #[test]
    fn test_properties_keep_order() {
        let mut metadata = ClassMetadata::new("App\\Point", "App", FxHashMap::default());
        metadata.add_property(property("y", DataType::Untyped));
        metadata.add_property(property("x", DataType::Primitive(Primitive::Int)));

        assert_eq!(metadata.property_names().collect::<Vec<_>>(), vec!["y", "x"]);
        assert!(metadata.has_property("x"));
        assert_eq!(
            metadata.property("x").map(|p| &p.data_type),
            Some(&DataType::Primitive(Primitive::Int))
        );
        assert!(metadata.property("z").is_none());
    }

    #[test]
    fn test_redeclared_method_replaces_previous() {
        let mut metadata = ClassMetadata::new("App\\Point", "App", FxHashMap::default());
        metadata.add_virtual_method(getter("x"));
        let mut redeclared = getter("x");
        redeclared.is_static = true;
        metadata.add_virtual_method(redeclared);

        assert_eq!(metadata.virtual_methods().len(), 1);
        assert!(metadata.virtual_method("x").unwrap().is_static);
        assert_eq!(metadata.virtual_method("x").unwrap().arity(), 0);
    }

    #[test]
    fn test_scope_uses_class_context() {
        let mut uses = FxHashMap::default();
        uses.insert("Money".to_string(), "Lib\\Money".to_string());
        let metadata = ClassMetadata::new("App\\Order", "App", uses);

        let scope = metadata.scope(None);
        assert_eq!(scope.class_name(), "App\\Order");
        assert_eq!(scope.resolve_class("Money"), "Lib\\Money");
    }
}
