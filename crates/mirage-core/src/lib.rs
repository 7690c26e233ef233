//! Mirage core - virtual method dispatch
//!
//! Classes declare methods they never implement in doc comments
//! (`@method string email()`, `@method static self create(string $email)`,
//! ...). When such a method is called, the host forwards the call to the
//! [`Dispatcher`], which picks the first [`CallHandler`] of a caller-supplied
//! chain that claims the call, validates it against the declaration and
//! runs it.
//!
//! Built-in handlers:
//! - `virtual_getter`: field accessors ([`handlers::VirtualGetter`])
//! - `named_constructor`: static factory methods ([`handlers::NamedConstructor`])
//! - `fixture_builder`: fluent fixture builders ([`handlers::FixtureBuilder`])
//!
//! # Example
//!
//! ```ignore
//! use mirage_core::{ClassDef, Mixin, Runtime};
//! use mirage_sdk::Value;
//!
//! let runtime = Runtime::new();
//! runtime.define_with(
//!     ClassDef::new("App\\Command\\Register")
//!         .doc("/**
//!               * @method static self instruct(string $email)
//!               * @method string email()
//!               */")
//!         .field("email", "/** @var string */"),
//!     Mixin::command(),
//! )?;
//!
//! let command = runtime.call_static("App\\Command\\Register", "instruct", &[Value::from("a@b.c")])?;
//! let email = runtime.call(command.as_object().unwrap(), "email", &[])?;
//! assert_eq!(email, Value::from("a@b.c"));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod mixins;
pub mod registry;
pub mod runtime;

pub use config::{ClassHooks, HandlerOptions, HandlerSpec, HooksConfig};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use handler::{CallHandler, HandlerContext, HandlerMeta, Receiver};
pub use mixins::Mixin;
pub use registry::{HandlerFactory, HandlerRegistry};
pub use runtime::{ClassDef, ClassRegistry, FieldDef, Runtime};
