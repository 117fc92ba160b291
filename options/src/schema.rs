//! Option schema compilation.
//!
//! An option schema is a mapping from option name to a spec. Specs come in
//! three shapes, so schemas stay terse in descriptors and config files:
//!
//! - a type name: `"boolean"`, `"string"`, `"numeric"`, `"array"`, `"hash"`
//! - a literal default whose JSON type implies the option type
//!   (`true`, `10`, `["a"]`, `"name"`)
//! - a mapping with `type`, `default`, `alias`, `values`, `required`
//!
//! # Example
//!
//! ```
//! use invocation_options::{OptionSchema, OptionType};
//! use serde_json::json;
//!
//! let schema = OptionSchema::compile(json!({
//!     "verbose": "boolean",
//!     "limit": 10,
//!     "format": {"type": "string", "values": ["json", "table"], "alias": "F"},
//! }).as_object().unwrap()).unwrap();
//!
//! assert_eq!(schema.get("limit").unwrap().kind, OptionType::Numeric);
//! assert_eq!(schema.get("verbose").unwrap().aliases, vec!["v"]);
//! assert_eq!(schema.get("format").unwrap().aliases, vec!["F", "f"]);
//! ```

use std::collections::HashSet;
use std::fmt;

use invocation_core::OptionMap;
use serde_json::Value;

use crate::error::SchemaError;

/// Value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Flag with no value; `--name` is true, `--no-name` is false.
    Boolean,
    /// Single string value.
    String,
    /// Integer or floating-point value.
    Numeric,
    /// Comma-separated list of strings.
    Array,
    /// Comma-separated `key:value` pairs.
    Hash,
}

impl OptionType {
    /// Parses a type name as written in a schema.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(Self::Boolean),
            "string" => Some(Self::String),
            "numeric" => Some(Self::Numeric),
            "array" => Some(Self::Array),
            "hash" => Some(Self::Hash),
            _ => None,
        }
    }

    /// Type implied by a literal default.
    fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(_) => Some(Self::Numeric),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Array),
            Value::Object(_) => Some(Self::Hash),
            Value::Null => None,
        }
    }

    /// Whether `value` is a valid value of this type.
    fn accepts(self, value: &Value) -> bool {
        Self::of_value(value) == Some(self)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Array => "array",
            Self::Hash => "hash",
        };
        f.write_str(name)
    }
}

/// One compiled option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    /// Canonical name, the key used in parsed option mappings.
    pub name: String,
    /// Value type.
    pub kind: OptionType,
    /// Value present in every parse result unless overridden.
    pub default: Option<Value>,
    /// Single-dash aliases, without the dash.
    pub aliases: Vec<String>,
    /// Allowed values for string and array options.
    pub values: Option<Vec<String>>,
    /// Parsing fails when the option is absent.
    pub required: bool,
}

impl OptionSpec {
    /// Flag forms for usage output, e.g. `-r, --render`.
    pub fn flags_label(&self) -> String {
        let mut forms: Vec<String> = self.aliases.iter().map(|a| format!("-{a}")).collect();
        forms.push(format!("--{}", self.name));
        forms.join(", ")
    }

    /// Type and default for usage output, e.g. `numeric (default: 10)`.
    pub fn detail_label(&self) -> String {
        let mut detail = self.kind.to_string();
        if let Some(values) = &self.values {
            detail.push_str(&format!(" [{}]", values.join("|")));
        }
        if let Some(default) = &self.default {
            detail.push_str(&format!(" (default: {default})"));
        }
        if self.required {
            detail.push_str(" (required)");
        }
        detail
    }
}

/// A compiled option schema, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSchema {
    specs: Vec<OptionSpec>,
}

impl OptionSchema {
    /// Compiles a schema mapping.
    ///
    /// Explicit aliases are registered first; then every option whose first
    /// letter is still unclaimed gets it as an automatic alias.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] for invalid names, unknown or missing types,
    /// mistyped defaults, malformed attributes, and alias collisions.
    pub fn compile(map: &OptionMap) -> Result<Self, SchemaError> {
        let mut specs = Vec::with_capacity(map.len());
        for (name, spec) in map {
            specs.push(compile_spec(name, spec)?);
        }

        let mut claimed: HashSet<String> = specs
            .iter()
            .filter(|s| s.name.chars().count() == 1)
            .map(|s| s.name.clone())
            .collect();
        for spec in &specs {
            for alias in &spec.aliases {
                if !claimed.insert(alias.clone()) {
                    return Err(SchemaError::DuplicateAlias(alias.clone()));
                }
            }
        }

        for spec in &mut specs {
            if spec.name.chars().count() == 1 {
                continue;
            }
            let Some(first) = spec.name.chars().next() else {
                continue;
            };
            let letter = first.to_string();
            if claimed.insert(letter.clone()) {
                spec.aliases.push(letter);
            }
        }

        Ok(Self { specs })
    }

    /// All options in declaration order.
    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    /// Looks up an option by canonical name.
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Mapping of every option that declares a default.
    pub fn defaults(&self) -> OptionMap {
        self.specs
            .iter()
            .filter_map(|s| s.default.clone().map(|d| (s.name.clone(), d)))
            .collect()
    }

    /// Whether the schema declares no options.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    pub(crate) fn position_of_alias(&self, alias: &str) -> Option<usize> {
        self.specs
            .iter()
            .position(|s| s.name == alias || s.aliases.iter().any(|a| a == alias))
    }

    pub(crate) fn spec_at(&self, index: usize) -> &OptionSpec {
        &self.specs[index]
    }
}

fn compile_spec(name: &str, spec: &Value) -> Result<OptionSpec, SchemaError> {
    if name.is_empty() || name.starts_with('-') {
        return Err(SchemaError::InvalidName(name.to_string()));
    }

    let mut compiled = OptionSpec {
        name: name.to_string(),
        kind: OptionType::Boolean,
        default: None,
        aliases: Vec::new(),
        values: None,
        required: false,
    };

    match spec {
        Value::String(s) => match OptionType::from_name(s) {
            Some(kind) => compiled.kind = kind,
            None => {
                compiled.kind = OptionType::String;
                compiled.default = Some(spec.clone());
            }
        },
        Value::Object(attrs) => {
            compiled.default = attrs.get("default").filter(|d| !d.is_null()).cloned();
            compiled.kind = match attrs.get("type") {
                Some(Value::String(type_name)) => {
                    OptionType::from_name(type_name).ok_or_else(|| SchemaError::UnknownType {
                        option: name.to_string(),
                        type_name: type_name.clone(),
                    })?
                }
                Some(other) => {
                    return Err(SchemaError::UnknownType {
                        option: name.to_string(),
                        type_name: other.to_string(),
                    });
                }
                None => compiled
                    .default
                    .as_ref()
                    .and_then(OptionType::of_value)
                    .ok_or_else(|| SchemaError::MissingType(name.to_string()))?,
            };
            compiled.aliases = string_list(name, "alias", attrs.get("alias"))?
                .into_iter()
                .map(|a| a.trim_start_matches('-').to_string())
                .collect();
            if attrs.contains_key("values") {
                compiled.values = Some(string_list(name, "values", attrs.get("values"))?);
            }
            compiled.required = match attrs.get("required") {
                None => false,
                Some(Value::Bool(required)) => *required,
                Some(_) => {
                    return Err(SchemaError::InvalidAttribute {
                        option: name.to_string(),
                        field: "required".to_string(),
                    });
                }
            };
        }
        Value::Null => return Err(SchemaError::MissingType(name.to_string())),
        literal => {
            compiled.kind = OptionType::of_value(literal)
                .ok_or_else(|| SchemaError::MissingType(name.to_string()))?;
            compiled.default = Some(literal.clone());
        }
    }

    if let Some(default) = &compiled.default
        && !compiled.kind.accepts(default)
    {
        return Err(SchemaError::InvalidDefault {
            option: name.to_string(),
            expected: compiled.kind.to_string(),
        });
    }

    Ok(compiled)
}

fn string_list(option: &str, field: &str, value: Option<&Value>) -> Result<Vec<String>, SchemaError> {
    let invalid = || SchemaError::InvalidAttribute {
        option: option.to_string(),
        field: field.to_string(),
    };
    match value {
        None => Ok(Vec::new()),
        Some(Value::String(s)) if !s.trim_start_matches('-').is_empty() => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) if !s.trim_start_matches('-').is_empty() => Ok(s.clone()),
                _ => Err(invalid()),
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}
