//! Mixin presets
//!
//! Ready-made hook configurations for common kinds of classes:
//!
//! | mixin            | instance chain      | static chain                         |
//! |------------------|---------------------|--------------------------------------|
//! | `Entity`         | `virtual_getter`    |                                      |
//! | `Command`        | `virtual_getter`    | `named_constructor` (`instruct`)     |
//! | `Event`          | `virtual_getter`    | `named_constructor` (`occur`)        |
//! | `FixtureBuilder` | `fixture_builder`   |                                      |

use std::collections::BTreeMap;

use mirage_sdk::Value;

use crate::config::{ClassHooks, HandlerSpec};
use crate::handlers::{METHOD_NAME_OPTION, STAGED_VALUES_FIELD};
use crate::runtime::ClassDef;

/// Mixin preset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mixin {
    /// Read-only accessors
    Entity,
    /// Accessors plus a named constructor
    Command {
        /// Name of the named constructor
        constructor: String,
    },
    /// Accessors plus a named constructor
    Event {
        /// Name of the named constructor
        constructor: String,
    },
    /// Fluent fixture builder
    FixtureBuilder,
}

impl Mixin {
    /// Command with the `instruct` constructor
    pub fn command() -> Self {
        Mixin::Command {
            constructor: "instruct".to_string(),
        }
    }

    /// Event with the `occur` constructor
    pub fn event() -> Self {
        Mixin::Event {
            constructor: "occur".to_string(),
        }
    }

    /// Hooks installed for a class using this mixin
    pub fn hooks(&self) -> ClassHooks {
        let getter = vec![HandlerSpec::new("virtual_getter")];
        match self {
            Mixin::Entity => ClassHooks {
                instance: getter,
                statics: Vec::new(),
            },
            Mixin::Command { constructor } | Mixin::Event { constructor } => ClassHooks {
                instance: getter,
                statics: vec![HandlerSpec::new("named_constructor")
                    .with_option(METHOD_NAME_OPTION, constructor.as_str())],
            },
            Mixin::FixtureBuilder => ClassHooks {
                instance: vec![HandlerSpec::new("fixture_builder")],
                statics: Vec::new(),
            },
        }
    }

    /// Add whatever the mixin needs to a class definition
    pub fn prepare(&self, class: ClassDef) -> ClassDef {
        match self {
            Mixin::FixtureBuilder => {
                class.field_with_default(STAGED_VALUES_FIELD, "", Value::Map(BTreeMap::new()))
            }
            _ => class,
        }
    }
}
