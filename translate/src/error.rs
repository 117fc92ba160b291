//! Error types for translation and dispatch.
//!
//! Arity and option-parse failures keep their own variants so callers can
//! special-case them; every other failure raised while translating (bad
//! quoting, a broken schema, a default that cannot be resolved, a renderer
//! error) is wrapped as [`TranslateError::Translation`] with its cause kept
//! as the error source.

use std::fmt;

use invocation_core::ValidationError;
use invocation_options::OptionParseError;
use thiserror::Error;

/// Boxed error returned by collaborators (handlers, renderers, targets).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Argument count a command expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedArity {
    Exactly(usize),
    AtLeast(usize),
}

impl fmt::Display for ExpectedArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

/// Translation failures.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Positional count does not fit the declared parameters.
    #[error("wrong number of arguments ({actual} for {expected})")]
    Arity {
        actual: usize,
        expected: ExpectedArity,
    },

    /// Any other failure during translation, default resolution, or rendering.
    #[error("{message}")]
    Translation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Malformed flags, passed through from the option parser.
    #[error(transparent)]
    OptionParse(#[from] OptionParseError),
}

impl TranslateError {
    /// Wraps an arbitrary failure, keeping it as the source.
    pub fn wrap(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self::Translation {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn default_failed(position: usize, source: BoxError) -> Self {
        Self::Translation {
            message: format!("unable to set default argument at position {position}: {source}"),
            source: Some(source),
        }
    }
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered command matches the requested name.
    #[error("command {0} not found")]
    UnknownCommand(String),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// The command body itself failed.
    #[error("{command}: {source}")]
    Command {
        command: String,
        #[source]
        source: BoxError,
    },
}

/// Registry failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("command {0} not found")]
    UnknownCommand(String),
}
