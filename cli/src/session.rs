//! The invocation target for built-in commands.

use std::collections::BTreeMap;

use invocation_core::CommandDescriptor;
use invocation_translate::{BoxError, Target};
use serde_json::Value;

/// Per-process context handed to every command body.
///
/// Contextual defaults are `$name` expressions, looked up in the config
/// `variables` first and the process environment second. Any other
/// expression must be a JSON literal.
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: BTreeMap<String, Value>,
    catalog: Vec<CommandDescriptor>,
}

impl Session {
    pub fn new(variables: BTreeMap<String, Value>) -> Self {
        Self {
            variables,
            catalog: Vec::new(),
        }
    }

    /// Records the final descriptors so commands can describe each other.
    pub fn with_catalog(mut self, catalog: impl IntoIterator<Item = CommandDescriptor>) -> Self {
        self.catalog = catalog.into_iter().collect();
        self
    }

    pub fn catalog(&self) -> &[CommandDescriptor] {
        &self.catalog
    }

    /// Descriptor by name or alias.
    pub fn describe(&self, name: &str) -> Option<&CommandDescriptor> {
        self.catalog.iter().find(|descriptor| descriptor.matches(name))
    }
}

impl Target for Session {
    fn evaluate(&self, expression: &str) -> Result<Value, BoxError> {
        let expression = expression.trim();
        if let Some(name) = expression.strip_prefix('$') {
            if let Some(value) = self.variables.get(name) {
                return Ok(value.clone());
            }
            return std::env::var(name.to_uppercase())
                .map(Value::String)
                .map_err(|_| format!("undefined variable ${name}").into());
        }
        serde_json::from_str(expression).map_err(|err| format!("cannot evaluate {expression:?}: {err}").into())
    }
}
