//! Option parsing for command invocations.
//!
//! This crate turns raw caller tokens into option values, in three pieces:
//!
//! - [`split`] / [`join`]: shell-style word splitting and its inverse.
//! - [`OptionSchema`]: compiles an option schema mapping (name → spec)
//!   into typed [`OptionSpec`]s with short aliases.
//! - [`OptionParser`]: parses a token list against a schema, returning
//!   option values and the leading / trailing non-option partitions.
//!
//! # Example
//!
//! ```
//! use invocation_options::{split, OptionParser, OptionSchema, ParseMode};
//! use serde_json::json;
//!
//! let schema = OptionSchema::compile(json!({
//!     "as": "string",
//!     "render": "boolean",
//! }).as_object().unwrap()).unwrap();
//!
//! let tokens = split("report --render --as 'wide table'").unwrap();
//! let parsed = OptionParser::new(schema).parse(&tokens, ParseMode::lenient()).unwrap();
//!
//! assert_eq!(parsed.options()["as"], json!("wide table"));
//! assert_eq!(parsed.non_options(), vec!["report"]);
//! ```

mod error;
mod lexer;
mod parser;
mod schema;

pub use error::{LexError, OptionParseError, SchemaError};
pub use lexer::{join, split, split_whitespace};
pub use parser::{OptionParser, ParseMode, ParsedOptions, looks_like_flag};
pub use schema::{OptionSchema, OptionSpec, OptionType};
