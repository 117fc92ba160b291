//! Translation and dispatch of command invocations.
//!
//! A call arrives as a list of raw arguments, usually one string typed by a
//! user. The [`Translator`] splits it, extracts command-local and global
//! options, fills declared defaults and checks arity; the [`Dispatcher`]
//! runs the command body from the [`Registry`], honouring `--help` and the
//! render gate.
//!
//! # Example
//!
//! ```
//! use invocation_core::{CommandDescriptor, Parameter};
//! use invocation_translate::{Dispatched, Dispatcher, Registry, RenderOptions, BoxError};
//! use serde_json::{Value, json};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         CommandDescriptor::new("add")
//!             .with_parameter(Parameter::required("a"))
//!             .with_parameter(Parameter::optional("b", json!(1)))
//!             .with_parameter(Parameter::optional("options", json!({})))
//!             .with_options(json!({"negate": "boolean"}).as_object().unwrap().clone()),
//!         |_: &(), args: Vec<Value>| {
//!             let sum = args[0].as_str().unwrap_or("0").parse::<i64>()? + args[1].as_i64().unwrap_or(0);
//!             let negate = args[2]["negate"] == json!(true);
//!             Ok(json!(if negate { -sum } else { sum }))
//!         },
//!     )
//!     .unwrap();
//!
//! let renderer = |value: Value, _: &RenderOptions| -> Result<Value, BoxError> { Ok(value) };
//! let dispatcher = Dispatcher::new(registry, |_: &str| {}, renderer);
//!
//! let result = dispatcher.call(&(), "add", vec![json!("41 --negate")]).unwrap();
//! assert_eq!(result, Dispatched::Returned(json!(-42)));
//! ```

mod cache;
mod dispatch;
mod error;
mod globals;
mod registry;
mod render;
mod translator;

pub use cache::ParserCache;
pub use dispatch::{Dispatched, Dispatcher, Usage, report_error};
pub use error::{BoxError, DispatchError, ExpectedArity, RegistryError, TranslateError};
pub use globals::{GLOBAL_KEYS, GlobalOptions, RENDER_KEYS, RenderOptions, default_global_schema};
pub use registry::{Entry, Handler, Registry, RegistrySnapshot, abbreviation_search};
pub use render::{Renderer, should_render};
pub use translator::{ParsedInvocation, Target, Translation, Translator};
