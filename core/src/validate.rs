//! Descriptor validation.
//!
//! Catches structural problems in command descriptors before they reach the
//! translator: empty names, aliases shadowing names, misplaced splat
//! parameters, commands that accept options without a slot for them, and
//! contextual defaults that are not expressions.
//!
//! # Examples
//!
//! ```
//! use invocation_core::*;
//!
//! let cmd = CommandDescriptor::new("status");
//! assert!(validate_descriptor(&cmd).is_empty());
//!
//! // Options need a trailing parameter slot
//! let bad = CommandDescriptor::new("status").with_options(Default::default());
//! assert_eq!(validate_descriptor(&bad), vec![ValidationError::MissingOptionsSlot("status".into())]);
//! ```

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::{CommandDescriptor, ParameterKind};

/// Descriptor validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Alias is empty or equal to the command's own name.
    #[error("invalid alias for command {0}")]
    InvalidAlias(String),
    /// Two parameters share a name.
    #[error("duplicate parameter: {0}")]
    DuplicateParameter(String),
    /// More than one splat parameter, or a splat that is not followed only
    /// by the options slot.
    #[error("misplaced splat parameter: {0}")]
    MisplacedSplat(String),
    /// Command accepts options but declares no parameter to receive them.
    #[error("command {0} accepts options but declares no options parameter")]
    MissingOptionsSlot(String),
    /// Contextual default is not a string expression.
    #[error("default for parameter {0} must be an expression string")]
    NonExpressionDefault(String),
    /// Two descriptors share a name or alias.
    #[error("duplicate command name or alias: {0}")]
    DuplicateCommand(String),
}

/// Validates one descriptor.
///
/// Returns the first problem found, or an empty list when the descriptor is
/// usable.
pub fn validate_descriptor(descriptor: &CommandDescriptor) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let name = descriptor.name.trim();
    if name.is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    if let Some(alias) = &descriptor.alias
        && (alias.trim().is_empty() || alias == name)
    {
        errors.push(ValidationError::InvalidAlias(name.to_string()));
        return errors;
    }

    let mut seen = HashSet::new();
    for parameter in &descriptor.parameters {
        if !seen.insert(parameter.name.as_str()) {
            errors.push(ValidationError::DuplicateParameter(parameter.name.clone()));
            return errors;
        }
    }

    // The splat may only be followed by the options slot.
    let splat_positions: Vec<usize> = descriptor
        .parameters
        .iter()
        .enumerate()
        .filter(|(_, p)| p.kind == ParameterKind::Splat)
        .map(|(i, _)| i)
        .collect();
    if let Some(&position) = splat_positions.first() {
        let last_allowed = if descriptor.accepts_options() {
            descriptor.arity().saturating_sub(2)
        } else {
            descriptor.arity().saturating_sub(1)
        };
        if splat_positions.len() > 1 || position != last_allowed {
            errors.push(ValidationError::MisplacedSplat(
                descriptor.parameters[position].name.clone(),
            ));
            return errors;
        }
    }

    if descriptor.accepts_options() && descriptor.arity() == 0 {
        errors.push(ValidationError::MissingOptionsSlot(name.to_string()));
        return errors;
    }

    if descriptor.contextual_defaults {
        let slots = if descriptor.accepts_options() {
            &descriptor.parameters[..descriptor.arity() - 1]
        } else {
            &descriptor.parameters[..]
        };
        for parameter in slots {
            if matches!(&parameter.default, Some(d) if !matches!(d, Value::String(_))) {
                errors.push(ValidationError::NonExpressionDefault(parameter.name.clone()));
                return errors;
            }
        }
    }

    errors
}

/// Validates a set of descriptors that will share one dispatch table.
///
/// Each descriptor is validated individually, then names and aliases are
/// checked for collisions across the whole set.
pub fn validate_descriptors<'a>(
    descriptors: impl IntoIterator<Item = &'a CommandDescriptor>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for descriptor in descriptors {
        errors.extend(validate_descriptor(descriptor));
        if !errors.is_empty() {
            return errors;
        }

        for key in std::iter::once(descriptor.name.as_str()).chain(descriptor.alias.as_deref()) {
            if !seen.insert(key) {
                errors.push(ValidationError::DuplicateCommand(key.to_string()));
                return errors;
            }
        }
    }

    errors
}
