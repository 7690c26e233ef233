//! Handler chain configuration
//!
//! A handler chain is an ordered list of [`HandlerSpec`]s: the identifier
//! of a registered handler plus its options. Chains are plain data and can
//! be loaded per class from TOML:
//!
//! ```toml
//! [classes."App\\Command\\Register"]
//! instance = ["virtual_getter"]
//! static = [{ handler = "named_constructor", options = { method_name = "instruct" } }]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Handler-specific options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerOptions(BTreeMap<String, String>);

impl HandlerOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get an option value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get an option value that the handler cannot work without
    pub fn require(&self, handler: &str, key: &str) -> DispatchResult<&str> {
        self.get(key).ok_or_else(|| DispatchError::InvalidOption {
            handler: handler.to_string(),
            option: key.to_string(),
            message: "option is required".to_string(),
        })
    }

    /// Check if no options are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One entry of a handler chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SpecRepr")]
pub struct HandlerSpec {
    /// Registered handler identifier
    pub handler: String,
    /// Options passed to the handler
    #[serde(default, skip_serializing_if = "HandlerOptions::is_empty")]
    pub options: HandlerOptions,
}

impl HandlerSpec {
    /// Handler without options
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            options: HandlerOptions::new(),
        }
    }

    /// Add an option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with(key, value);
        self
    }
}

impl From<&str> for HandlerSpec {
    fn from(handler: &str) -> Self {
        HandlerSpec::new(handler)
    }
}

/// Accepts either a bare identifier or a `{ handler, options }` table
#[derive(Deserialize)]
#[serde(untagged)]
enum SpecRepr {
    Name(String),
    Full {
        handler: String,
        #[serde(default)]
        options: HandlerOptions,
    },
}

impl From<SpecRepr> for HandlerSpec {
    fn from(repr: SpecRepr) -> Self {
        match repr {
            SpecRepr::Name(handler) => HandlerSpec::new(handler),
            SpecRepr::Full { handler, options } => HandlerSpec { handler, options },
        }
    }
}

/// Hooks of one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHooks {
    /// Chain consulted when an undefined method is called on an instance
    #[serde(default)]
    pub instance: Vec<HandlerSpec>,
    /// Chain consulted when an undefined method is called on the class
    #[serde(default, rename = "static")]
    pub statics: Vec<HandlerSpec>,
}

impl ClassHooks {
    /// Check if neither chain has entries
    pub fn is_empty(&self) -> bool {
        self.instance.is_empty() && self.statics.is_empty()
    }
}

/// Hooks for a set of classes, keyed by class name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Class name to hooks
    #[serde(default)]
    pub classes: BTreeMap<String, ClassHooks>,
}

impl HooksConfig {
    /// Parse a TOML document
    pub fn from_toml(source: &str) -> DispatchResult<Self> {
        toml::from_str(source).map_err(|err| DispatchError::InvalidConfig(err.to_string()))
    }

    /// Render as a TOML document
    pub fn to_toml(&self) -> DispatchResult<String> {
        toml::to_string(self).map_err(|err| DispatchError::InvalidConfig(err.to_string()))
    }

    /// Hooks of a class, if configured
    pub fn hooks_for(&self, class_name: &str) -> Option<&ClassHooks> {
        self.classes.get(mirage_sdk::normalize_class_name(class_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hooks() {
        let config = HooksConfig::from_toml(
            r#"
            [classes."App\\Command\\Register"]
            instance = ["virtual_getter"]
            static = [{ handler = "named_constructor", options = { method_name = "instruct" } }]

            [classes."App\\Test\\UserBuilder"]
            instance = [{ handler = "fixture_builder" }]
            "#,
        )
        .unwrap();

        let hooks = config.hooks_for("\\App\\Command\\Register").unwrap();
        assert_eq!(hooks.instance, vec![HandlerSpec::new("virtual_getter")]);
        assert_eq!(
            hooks.statics,
            vec![HandlerSpec::new("named_constructor").with_option("method_name", "instruct")]
        );

        let builder = config.hooks_for("App\\Test\\UserBuilder").unwrap();
        assert_eq!(builder.instance[0].handler, "fixture_builder");
        assert!(builder.instance[0].options.is_empty());
        assert!(builder.statics.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let err = HooksConfig::from_toml("[classes.Foo]\ninstance = [42]").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidConfig(_)));
    }

    #[test]
    fn test_required_option() {
        let options = HandlerOptions::new().with("method_name", "create");
        assert_eq!(options.require("named_constructor", "method_name").unwrap(), "create");

        let err = HandlerOptions::new()
            .require("named_constructor", "method_name")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid option \"method_name\" for handler \"named_constructor\": option is required"
        );
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = HooksConfig::default();
        config.classes.insert(
            "App\\Event\\Happened".to_string(),
            ClassHooks {
                instance: vec!["virtual_getter".into()],
                statics: vec![HandlerSpec::new("named_constructor").with_option("method_name", "occur")],
            },
        );

        let text = config.to_toml().unwrap();
        assert_eq!(HooksConfig::from_toml(&text).unwrap(), config);
    }
}
