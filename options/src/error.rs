//! Error types for lexing, schema compilation, and option parsing.

use thiserror::Error;

/// Shell-style splitting failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A quote was opened and never closed.
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
    /// Input ended with a backslash escaping nothing.
    #[error("trailing backslash escape")]
    TrailingEscape,
}

/// Problems in an option schema mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Option name is empty or starts with a dash.
    #[error("invalid option name: {0:?}")]
    InvalidName(String),
    /// `type` names something other than boolean/string/numeric/array/hash.
    #[error("unknown type {type_name:?} for option {option}")]
    UnknownType { option: String, type_name: String },
    /// No `type` given and none can be inferred from a default.
    #[error("cannot determine type of option {0}")]
    MissingType(String),
    /// Default value does not fit the declared type.
    #[error("default for option {option} is not a valid {expected} value")]
    InvalidDefault { option: String, expected: String },
    /// `alias` or `values` has the wrong shape.
    #[error("invalid {field} for option {option}")]
    InvalidAttribute { option: String, field: String },
    /// Two options claim the same short alias.
    #[error("duplicate option alias: {0}")]
    DuplicateAlias(String),
}

/// Malformed flags or values in a token list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionParseError {
    /// A value-taking option was last, or followed by another flag.
    #[error("no value provided for option '{0}'")]
    MissingValue(String),
    /// Numeric option given a non-number.
    #[error("invalid numeric value for option '{option}': {value}")]
    InvalidNumeric { option: String, value: String },
    /// Boolean option given something other than true/false.
    #[error("invalid boolean value for option '{option}': {value}")]
    InvalidBoolean { option: String, value: String },
    /// Value outside the option's allowed values.
    #[error("invalid value for option '{option}': {value} (expected one of: {allowed})")]
    InvalidValue {
        option: String,
        value: String,
        allowed: String,
    },
    /// Hash entry without a `key:value` shape.
    #[error("invalid hash entry for option '{option}': {entry}")]
    InvalidHashEntry { option: String, entry: String },
    /// Abbreviation matches more than one option.
    #[error("ambiguous option '{given}' (could be: {candidates})")]
    AmbiguousOption { given: String, candidates: String },
    /// A required option was not supplied.
    #[error("missing required option '{0}'")]
    RequiredMissing(String),
}
