//! Class registry for the in-memory object runtime
//!
//! Holds class definitions and implements both host contracts on top of
//! them: [`DeclarationSource`] for metadata extraction and [`Reflector`]
//! for field access. Instances are plain field maps.

use std::sync::Arc;

use mirage_sdk::{
    namespace_of, normalize_class_name, short_name_of, ClassDeclaration, DeclarationSource,
    FieldDeclaration, Instance, ObjectRef, ReflectError, ReflectResult, Reflector, Value,
};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{DispatchError, DispatchResult};

/// Field of a class definition
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Raw doc comment (`@var`, `@example`)
    pub doc_comment: String,
    /// Value of the field in a freshly allocated instance
    pub default: Value,
}

/// Class definition
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Fully-qualified class name
    pub name: String,
    /// Parent class, if any
    pub parent: Option<String>,
    /// Use statements: alias to fully-qualified name
    pub use_statements: FxHashMap<String, String>,
    /// Raw class doc comment (`@method`, `@property-read`)
    pub doc_comment: String,
    /// Own fields in declaration order
    pub fields: Vec<FieldDef>,
}

impl ClassDef {
    /// Start a definition
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_class_name(name).to_string(),
            parent: None,
            use_statements: FxHashMap::default(),
            doc_comment: String::new(),
            fields: Vec::new(),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(normalize_class_name(parent).to_string());
        self
    }

    /// Import a class under its short name
    pub fn uses(mut self, class_name: &str) -> Self {
        let class_name = normalize_class_name(class_name);
        self.use_statements
            .insert(short_name_of(class_name).to_string(), class_name.to_string());
        self
    }

    /// Import a class under an alias
    pub fn uses_as(mut self, class_name: &str, alias: &str) -> Self {
        self.use_statements
            .insert(alias.to_string(), normalize_class_name(class_name).to_string());
        self
    }

    /// Set the class doc comment
    pub fn doc(mut self, doc_comment: impl Into<String>) -> Self {
        self.doc_comment = doc_comment.into();
        self
    }

    /// Add a field defaulting to null
    pub fn field(self, name: impl Into<String>, doc_comment: impl Into<String>) -> Self {
        self.field_with_default(name, doc_comment, Value::Null)
    }

    /// Add a field with a default value
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        doc_comment: impl Into<String>,
        default: Value,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            doc_comment: doc_comment.into(),
            default,
        });
        self
    }
}

/// Registry of class definitions
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<FxHashMap<String, Arc<ClassDef>>>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Definitions are immutable once registered.
    pub fn register(&self, class: ClassDef) -> DispatchResult<()> {
        let mut classes = self.classes.write();
        if classes.contains_key(&class.name) {
            return Err(DispatchError::DuplicateClass(class.name));
        }
        classes.insert(class.name.clone(), Arc::new(class));
        Ok(())
    }

    /// Get a class definition by name
    pub fn get(&self, class_name: &str) -> Option<Arc<ClassDef>> {
        self.classes
            .read()
            .get(normalize_class_name(class_name))
            .cloned()
    }

    /// Check if a class is registered
    pub fn contains(&self, class_name: &str) -> bool {
        self.classes
            .read()
            .contains_key(normalize_class_name(class_name))
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// The class and its registered ancestors, starting with the class itself
    pub fn hierarchy(&self, class_name: &str) -> Vec<Arc<ClassDef>> {
        let classes = self.classes.read();
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(normalize_class_name(class_name).to_string());

        while let Some(name) = current {
            if !seen.insert(name.clone()) {
                break;
            }
            match classes.get(&name) {
                Some(class) => {
                    current = class.parent.clone();
                    chain.push(Arc::clone(class));
                }
                None => break,
            }
        }

        chain
    }

    /// All fields of a class, inherited ones first. A redeclared field keeps
    /// the position of the ancestor's declaration.
    pub fn all_fields(&self, class_name: &str) -> Vec<FieldDef> {
        let mut fields: Vec<FieldDef> = Vec::new();
        for class in self.hierarchy(class_name).iter().rev() {
            for field in &class.fields {
                match fields.iter_mut().find(|existing| existing.name == field.name) {
                    Some(existing) => *existing = field.clone(),
                    None => fields.push(field.clone()),
                }
            }
        }
        fields
    }
}

impl DeclarationSource for ClassRegistry {
    fn declaration(&self, class_name: &str) -> Option<ClassDeclaration> {
        let class = self.get(class_name)?;
        let fields = self
            .all_fields(&class.name)
            .into_iter()
            .map(|field| FieldDeclaration::new(field.name, field.doc_comment))
            .collect();

        Some(ClassDeclaration {
            name: class.name.clone(),
            namespace: namespace_of(&class.name).to_string(),
            use_statements: class.use_statements.clone(),
            doc_comment: class.doc_comment.clone(),
            fields,
        })
    }

    fn contains(&self, class_name: &str) -> bool {
        ClassRegistry::contains(self, class_name)
    }
}

impl Reflector for ClassRegistry {
    fn get_field(&self, object: &ObjectRef, field: &str) -> ReflectResult<Value> {
        let instance = object.read();
        instance
            .get(field)
            .cloned()
            .ok_or_else(|| ReflectError::UnknownField {
                class: instance.class().to_string(),
                field: field.to_string(),
            })
    }

    fn set_field(&self, object: &ObjectRef, field: &str, value: Value) -> ReflectResult<()> {
        let mut instance = object.write();
        if !instance.has_field(field) {
            return Err(ReflectError::UnknownField {
                class: instance.class().to_string(),
                field: field.to_string(),
            });
        }
        instance.set(field, value);
        Ok(())
    }

    fn allocate(&self, class_name: &str) -> ReflectResult<ObjectRef> {
        let class_name = normalize_class_name(class_name);
        if !ClassRegistry::contains(self, class_name) {
            return Err(ReflectError::UnknownClass(class_name.to_string()));
        }

        let fields = self
            .all_fields(class_name)
            .into_iter()
            .map(|field| (field.name, field.default));
        Ok(ObjectRef::new(Instance::with_fields(class_name, fields)))
    }

    fn class_exists(&self, class_name: &str) -> bool {
        ClassRegistry::contains(self, class_name)
    }

    fn is_subclass_of(&self, class_name: &str, ancestor: &str) -> bool {
        let ancestor = normalize_class_name(ancestor);
        if normalize_class_name(class_name) == ancestor {
            return true;
        }
        self.hierarchy(class_name)
            .iter()
            .any(|class| class.name == ancestor)
    }
}
