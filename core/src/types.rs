//! Command descriptor definitions.
//!
//! A [`CommandDescriptor`] is the static metadata for one invocable command:
//! its declared parameters (with optional defaults), whether it takes an
//! unbounded trailing run of arguments, and the option schemas used when a
//! caller passes flags. Descriptors serialize with [`serde`] so front ends can
//! declare or override them from configuration files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An options mapping or option schema: option name to value/spec.
pub type OptionMap = Map<String, Value>;

/// How a declared parameter binds caller arguments.
///
/// # Examples
///
/// ```
/// use invocation_core::ParameterKind;
///
/// assert_eq!(ParameterKind::default(), ParameterKind::Required);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Must be supplied by the caller (the default).
    #[default]
    Required,
    /// May be omitted; filled from its default when one is declared.
    Optional,
    /// Collects every remaining positional argument.
    Splat,
}

/// A declared positional parameter.
///
/// # Examples
///
/// ```
/// use invocation_core::{Parameter, ParameterKind};
/// use serde_json::json;
///
/// let name = Parameter::required("name");
/// assert!(name.default.is_none());
///
/// let limit = Parameter::optional("limit", json!(10));
/// assert_eq!(limit.kind, ParameterKind::Optional);
/// assert_eq!(limit.default, Some(json!(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, used in usage output.
    pub name: String,
    /// Binding kind.
    #[serde(default)]
    pub kind: ParameterKind,
    /// Default value, or default expression when the owning descriptor
    /// evaluates defaults contextually.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Parameter {
    /// Creates a required parameter.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Required,
            default: None,
        }
    }

    /// Creates an optional parameter with a default.
    pub fn optional(name: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Optional,
            default: Some(default),
        }
    }

    /// Creates an optional parameter without a default.
    pub fn optional_without_default(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Optional,
            default: None,
        }
    }

    /// Creates a splat parameter collecting trailing arguments.
    pub fn splat(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Splat,
            default: None,
        }
    }

    /// Renders the parameter the way usage lines show it: `name`, `[name=default]`
    /// or `[*name]`.
    pub fn signature(&self) -> String {
        match (self.kind, &self.default) {
            (ParameterKind::Splat, _) => format!("[*{}]", self.name),
            (_, Some(Value::String(default))) => format!("[{}={}]", self.name, default),
            (_, Some(default)) => format!("[{}={}]", self.name, default),
            (ParameterKind::Optional, None) => format!("[{}]", self.name),
            (ParameterKind::Required, None) => self.name.clone(),
        }
    }
}

/// Static metadata for one invocable command.
///
/// The last declared parameter of a command that accepts options is the
/// slot reserved for the options mapping; [`arity`](Self::arity) counts it.
///
/// # Examples
///
/// ```
/// use invocation_core::{CommandDescriptor, Parameter};
/// use serde_json::json;
///
/// let cmd = CommandDescriptor::new("search")
///     .with_alias("s")
///     .with_parameter(Parameter::required("query"))
///     .with_parameter(Parameter::optional("limit", json!(10)))
///     .with_parameter(Parameter::optional("options", json!({})))
///     .with_options(json!({"exact": "boolean"}).as_object().unwrap().clone());
///
/// assert_eq!(cmd.arity(), 3);
/// assert!(!cmd.is_variadic());
/// assert!(cmd.accepts_options());
/// assert!(!cmd.is_render_aware());
/// assert!(cmd.matches("s"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Unique command name.
    pub name: String,
    /// Optional alternative name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Short description for listings and usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared positional parameters, in order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Command-local option schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
    /// Custom render/global option schema, merged over the default global schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_options: Option<OptionMap>,
    /// Evaluate default values as expressions against the invocation target.
    #[serde(default)]
    pub contextual_defaults: bool,
}

impl CommandDescriptor {
    /// Creates a descriptor with no parameters and no options.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Appends a declared parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the command-local option schema.
    pub fn with_options(mut self, options: OptionMap) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the custom render option schema.
    pub fn with_render_options(mut self, render_options: OptionMap) -> Self {
        self.render_options = Some(render_options);
        self
    }

    /// Marks default values as expressions evaluated by the invocation target.
    pub fn with_contextual_defaults(mut self) -> Self {
        self.contextual_defaults = true;
        self
    }

    /// Number of declared positional parameters, including the options slot.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the command accepts an unbounded trailing run of arguments.
    pub fn is_variadic(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.kind == ParameterKind::Splat)
    }

    /// Whether invocations go through option translation.
    pub fn accepts_options(&self) -> bool {
        self.options.is_some() || self.render_options.is_some()
    }

    /// Whether the command declares a custom render schema, making rendering
    /// opt-out instead of opt-in.
    pub fn is_render_aware(&self) -> bool {
        self.render_options.is_some()
    }

    /// Checks the name or alias.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.alias.as_deref() == Some(name)
    }

    /// Usage line: name followed by parameter signatures, without the options slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use invocation_core::{CommandDescriptor, Parameter};
    /// use serde_json::json;
    ///
    /// let cmd = CommandDescriptor::new("echo")
    ///     .with_parameter(Parameter::splat("words"))
    ///     .with_parameter(Parameter::optional("options", json!({})))
    ///     .with_options(Default::default());
    /// assert_eq!(cmd.usage_line(), "echo [*words] [--options]");
    /// ```
    pub fn usage_line(&self) -> String {
        let shown = if self.accepts_options() {
            &self.parameters[..self.arity().saturating_sub(1)]
        } else {
            &self.parameters[..]
        };
        let mut parts = vec![self.name.clone()];
        parts.extend(shown.iter().map(Parameter::signature));
        if self.accepts_options() {
            parts.push("[--options]".to_string());
        }
        parts.join(" ")
    }
}

/// Partial descriptor used to customize a registered command.
///
/// Every field is optional; set fields replace (or, for option schemas,
/// recursively merge into) the corresponding descriptor field. See
/// [`apply_overlay`](crate::apply_overlay).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_options: Option<OptionMap>,
}
