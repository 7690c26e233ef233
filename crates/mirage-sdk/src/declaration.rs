//! Class declarations as handed over by the host
//!
//! A declaration is the raw, unparsed material metadata is built from:
//! the class doc comment, the doc comment of every field, and the
//! namespace/use-statement context needed to resolve short type names.

use rustc_hash::FxHashMap;

use crate::{namespace_of, normalize_class_name, short_name_of};

/// Declared field of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// Field name (without sigil)
    pub name: String,
    /// Raw doc comment attached to the field, empty if none
    pub doc_comment: String,
}

impl FieldDeclaration {
    /// Create a field declaration
    pub fn new(name: impl Into<String>, doc_comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_comment: doc_comment.into(),
        }
    }
}

/// Declaration of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    /// Fully-qualified class name
    pub name: String,
    /// Namespace the class is declared in
    pub namespace: String,
    /// Use statements of the declaring file: alias to fully-qualified name
    pub use_statements: FxHashMap<String, String>,
    /// Raw class doc comment, empty if none
    pub doc_comment: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDeclaration>,
}

impl ClassDeclaration {
    /// Create a declaration; the namespace is derived from the class name.
    pub fn new(name: &str) -> Self {
        let name = normalize_class_name(name);
        Self {
            name: name.to_string(),
            namespace: namespace_of(name).to_string(),
            use_statements: FxHashMap::default(),
            doc_comment: String::new(),
            fields: Vec::new(),
        }
    }

    /// Add a use statement aliased by the short name of the imported class
    pub fn with_use(mut self, class_name: &str) -> Self {
        let class_name = normalize_class_name(class_name);
        self.use_statements
            .insert(short_name_of(class_name).to_string(), class_name.to_string());
        self
    }

    /// Add a use statement with an explicit alias
    pub fn with_use_as(mut self, class_name: &str, alias: &str) -> Self {
        self.use_statements
            .insert(alias.to_string(), normalize_class_name(class_name).to_string());
        self
    }

    /// Set the class doc comment
    pub fn with_doc(mut self, doc_comment: impl Into<String>) -> Self {
        self.doc_comment = doc_comment.into();
        self
    }

    /// Append a field
    pub fn with_field(mut self, name: impl Into<String>, doc_comment: impl Into<String>) -> Self {
        self.fields.push(FieldDeclaration::new(name, doc_comment));
        self
    }
}

/// Source of class declarations
pub trait DeclarationSource: Send + Sync {
    /// Look up the declaration of a class
    fn declaration(&self, class_name: &str) -> Option<ClassDeclaration>;

    /// Check if a class is declared
    fn contains(&self, class_name: &str) -> bool {
        self.declaration(class_name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_builder() {
        let decl = ClassDeclaration::new("\\App\\Command\\Register")
            .with_use("App\\Model\\User")
            .with_use_as("Lib\\Clock\\SystemClock", "Clock")
            .with_doc("/** @method string email() */")
            .with_field("email", "/** @var string */");

        assert_eq!(decl.name, "App\\Command\\Register");
        assert_eq!(decl.namespace, "App\\Command");
        assert_eq!(decl.use_statements.get("User").map(String::as_str), Some("App\\Model\\User"));
        assert_eq!(
            decl.use_statements.get("Clock").map(String::as_str),
            Some("Lib\\Clock\\SystemClock")
        );
        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.fields[0].name, "email");
    }
}
