//! Core command descriptor types and option schema primitives.
//!
//! This crate defines the static side of command invocation:
//!
//! - [`CommandDescriptor`]: one invocable command: declared parameters,
//!   variadic flag, option schemas, and how defaults are resolved.
//! - [`Parameter`]: a positional parameter with an optional default.
//! - [`DescriptorOverlay`]: a partial descriptor used to customize a
//!   registered command from configuration.
//!
//! Merging ([`recursive_merge`], [`apply_overlay`]) combines option schemas
//! key by key at every nesting level. Validation ([`validate_descriptor`],
//! [`validate_descriptors`]) catches structural problems before dispatch.
//!
//! # Example
//!
//! ```
//! use invocation_core::*;
//! use serde_json::json;
//!
//! let cmd = CommandDescriptor::new("search")
//!     .with_parameter(Parameter::required("query"))
//!     .with_parameter(Parameter::optional("options", json!({})))
//!     .with_options(json!({"limit": 10}).as_object().unwrap().clone());
//!
//! assert_eq!(cmd.arity(), 2);
//! assert!(validate_descriptor(&cmd).is_empty());
//! ```

mod merge;
mod types;
mod validate;

pub use merge::{apply_overlay, recursive_merge};
pub use types::*;
pub use validate::{ValidationError, validate_descriptor, validate_descriptors};
