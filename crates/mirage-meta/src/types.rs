//! Declared data types
//!
//! A [`DataType`] is the resolved form of a type expression written in a
//! `@var`, `@method` or `@property-read` tag. Class names are resolved to
//! their fully-qualified form against the [`TypeScope`] of the declaring
//! class when the type is parsed, so validation never needs the scope again.

use std::fmt;

use mirage_sdk::{normalize_class_name, DeclarationSource, Reflector, Value};
use rustc_hash::FxHashMap;

use crate::error::{MetadataError, MetadataResult};

/// Built-in scalar and compound types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `int` / `integer`
    Int,
    /// `float` / `double`
    Float,
    /// `string`
    String,
    /// `bool` / `boolean`
    Bool,
    /// `true`: only the true value
    True,
    /// `false`: only the false value
    False,
    /// `array` / `iterable`: lists and maps
    Array,
    /// `object`: any object instance
    Object,
    /// `null`
    Null,
    /// `void`: only the null value
    Void,
}

impl Primitive {
    fn from_name(name: &str) -> Option<Self> {
        let primitive = match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Primitive::Int,
            "float" | "double" => Primitive::Float,
            "string" => Primitive::String,
            "bool" | "boolean" => Primitive::Bool,
            "true" => Primitive::True,
            "false" => Primitive::False,
            "array" | "iterable" => Primitive::Array,
            "object" => Primitive::Object,
            "null" => Primitive::Null,
            "void" => Primitive::Void,
            _ => return None,
        };
        Some(primitive)
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Primitive::Int => matches!(value, Value::Int(_)),
            Primitive::Float => matches!(value, Value::Float(_) | Value::Int(_)),
            Primitive::String => matches!(value, Value::String(_)),
            Primitive::Bool => matches!(value, Value::Bool(_)),
            Primitive::True => matches!(value, Value::Bool(true)),
            Primitive::False => matches!(value, Value::Bool(false)),
            Primitive::Array => matches!(value, Value::List(_) | Value::Map(_)),
            Primitive::Object => matches!(value, Value::Object(_)),
            Primitive::Null | Primitive::Void => value.is_null(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::True => "true",
            Primitive::False => "false",
            Primitive::Array => "array",
            Primitive::Object => "object",
            Primitive::Null => "null",
            Primitive::Void => "void",
        }
    }
}

/// A resolved declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// No type declared; every value conforms
    Untyped,
    /// `mixed`
    Mixed,
    /// Built-in type
    Primitive(Primitive),
    /// `self`
    SelfType,
    /// `static` / `$this`
    StaticType,
    /// Fully-qualified class name
    Class(String),
    /// `T[]`: every element conforms to `T`
    Array(Box<DataType>),
    /// `A|B`
    Union(Vec<DataType>),
}

/// Runtime context a value is validated in
#[derive(Clone, Copy)]
pub struct TypeContext<'a> {
    /// Class `self` and `static` refer to
    pub class_name: &'a str,
    /// Class hierarchy lookups for object values
    pub reflector: &'a dyn Reflector,
}

impl DataType {
    /// Parse a type expression in the given scope
    ///
    /// Members of a union may be grouped with parentheses, as in
    /// `(int|string)[]`, which is also how such types are displayed.
    pub fn parse(expression: &str, scope: &TypeScope<'_>) -> MetadataResult<DataType> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Ok(DataType::Untyped);
        }

        if let Some(inner) = expression.strip_prefix('?') {
            if split_union(inner).map_or(true, |members| members.len() > 1) {
                return Err(scope.invalid(expression, "nullable marker cannot prefix a union"));
            }
            let inner = Self::parse_member(inner, expression, scope)?;
            return Ok(DataType::Union(vec![inner, DataType::Primitive(Primitive::Null)]));
        }

        Self::parse_union(expression, expression, scope)
    }

    fn parse_union(union: &str, expression: &str, scope: &TypeScope<'_>) -> MetadataResult<DataType> {
        let members = split_union(union)
            .ok_or_else(|| scope.invalid(expression, "unbalanced parentheses"))?
            .into_iter()
            .map(|member| Self::parse_member(member, expression, scope))
            .collect::<MetadataResult<Vec<_>>>()?;

        match <[DataType; 1]>::try_from(members) {
            Ok([single]) => Ok(single),
            Err(members) => Ok(DataType::Union(members)),
        }
    }

    fn parse_member(member: &str, expression: &str, scope: &TypeScope<'_>) -> MetadataResult<DataType> {
        let member = member.trim();
        if let Some(element) = member.strip_suffix("[]") {
            let element = Self::parse_member(element, expression, scope)?;
            return Ok(DataType::Array(Box::new(element)));
        }
        if let Some(group) = member.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
            return Self::parse_union(group, expression, scope);
        }

        if member.is_empty() {
            return Err(scope.invalid(expression, "empty type member"));
        }
        if let Some(primitive) = Primitive::from_name(member) {
            return Ok(DataType::Primitive(primitive));
        }

        match member.to_ascii_lowercase().as_str() {
            "mixed" => return Ok(DataType::Mixed),
            "self" => return Ok(DataType::SelfType),
            "static" | "$this" => return Ok(DataType::StaticType),
            _ => {}
        }

        if !is_class_name(member) {
            return Err(scope.invalid(expression, &format!("`{}` is not a type name", member)));
        }
        Ok(DataType::Class(scope.resolve_class(member)))
    }

    /// Check whether a runtime value conforms to this type
    pub fn accepts(&self, value: &Value, context: &TypeContext<'_>) -> bool {
        match self {
            DataType::Untyped | DataType::Mixed => true,
            DataType::Primitive(primitive) => primitive.accepts(value),
            DataType::SelfType | DataType::StaticType => match value {
                Value::String(name) => normalize_class_name(name) == context.class_name,
                _ => context.reflector.is_instance_of(value, context.class_name),
            },
            DataType::Class(name) => context.reflector.is_instance_of(value, name),
            DataType::Array(element) => match value {
                Value::List(items) => items.iter().all(|item| element.accepts(item, context)),
                Value::Map(entries) => entries.values().all(|item| element.accepts(item, context)),
                _ => false,
            },
            DataType::Union(members) => members.iter().any(|member| member.accepts(value, context)),
        }
    }

    /// Class named by this type, if it is a plain class reference
    pub fn class_name(&self) -> Option<&str> {
        match self {
            DataType::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Untyped | DataType::Mixed => write!(f, "mixed"),
            DataType::Primitive(primitive) => write!(f, "{}", primitive.name()),
            DataType::SelfType => write!(f, "self"),
            DataType::StaticType => write!(f, "static"),
            DataType::Class(name) => write!(f, "{}", name),
            DataType::Array(element) => match element.as_ref() {
                DataType::Union(_) => write!(f, "({})[]", element),
                _ => write!(f, "{}[]", element),
            },
            DataType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

/// Name-resolution scope of a declaring class
#[derive(Clone, Copy)]
pub struct TypeScope<'a> {
    class_name: &'a str,
    namespace: &'a str,
    use_statements: &'a FxHashMap<String, String>,
    source: Option<&'a dyn DeclarationSource>,
}

impl<'a> TypeScope<'a> {
    /// Create a scope
    ///
    /// `source` is consulted to decide whether an unqualified name refers to
    /// a class of the current namespace. Without it such names stay as given.
    pub fn new(
        class_name: &'a str,
        namespace: &'a str,
        use_statements: &'a FxHashMap<String, String>,
        source: Option<&'a dyn DeclarationSource>,
    ) -> Self {
        Self {
            class_name,
            namespace,
            use_statements,
            source,
        }
    }

    /// Class the scope belongs to
    pub fn class_name(&self) -> &'a str {
        self.class_name
    }

    /// Resolve a class name to its fully-qualified form
    pub fn resolve_class(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }

        let (first, rest) = match name.find('\\') {
            Some(index) => (&name[..index], &name[index..]),
            None => (name, ""),
        };
        if let Some(target) = self.use_statements.get(first) {
            return format!("{}{}", target, rest);
        }

        if !self.namespace.is_empty() {
            let candidate = format!("{}\\{}", self.namespace, name);
            if self.source.is_some_and(|source| source.contains(&candidate)) {
                return candidate;
            }
        }

        name.to_string()
    }

    fn invalid(&self, expression: &str, message: &str) -> MetadataError {
        MetadataError::InvalidType {
            class: self.class_name.to_string(),
            expression: expression.to_string(),
            message: message.to_string(),
        }
    }
}

/// Split a union at the `|`s outside parentheses, `None` if they do not balance
fn split_union(union: &str) -> Option<Vec<&str>> {
    let mut members = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in union.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            '|' if depth == 0 => {
                members.push(&union[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    members.push(&union[start..]);
    Some(members)
}

fn is_class_name(name: &str) -> bool {
    let name = name.strip_prefix('\\').unwrap_or(name);
    !name.is_empty()
        && name.split('\\').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
