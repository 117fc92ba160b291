//! Schema-driven option parsing.
//!
//! [`OptionParser::parse`] walks a token list in three phases:
//!
//! 1. **Leading non-options**: tokens are collected until the first token
//!    the schema recognizes as a flag.
//! 2. **Flag run**: consecutive recognized flags (and their values) are
//!    consumed. An unrecognized token ends the run; a `--` ends it and is
//!    dropped.
//! 3. **Trailing non-options**: everything left. With
//!    [`ParseMode::delete_unrecognized`], flag-looking tokens are removed
//!    from this partition instead of being passed on as positional data.
//!
//! The parser itself is stateless; partitions come back in [`ParsedOptions`],
//! so one compiled parser can be shared and reused.

use std::collections::VecDeque;

use invocation_core::OptionMap;
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::OptionParseError;
use crate::schema::{OptionSchema, OptionSpec, OptionType};

/// Parse behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMode<'a> {
    /// Drop unrecognized flags from the trailing partition.
    pub delete_unrecognized: bool,
    /// Long names owned by another parser. A token naming one of these
    /// exactly is never resolved as an abbreviation of a longer option.
    pub reserved: &'a [&'a str],
}

impl<'a> ParseMode<'a> {
    /// Mode that drops unrecognized trailing flags.
    pub fn lenient() -> Self {
        Self {
            delete_unrecognized: true,
            reserved: &[],
        }
    }

    pub fn with_reserved(self, reserved: &'a [&'a str]) -> Self {
        Self { reserved, ..self }
    }
}

/// Result of one parse: option values plus token partitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOptions {
    options: OptionMap,
    leading: Vec<String>,
    trailing: Vec<String>,
}

impl ParsedOptions {
    /// Parsed option values, starting from schema defaults.
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    /// Tokens before the first recognized flag.
    pub fn leading_non_options(&self) -> &[String] {
        &self.leading
    }

    /// Tokens after the flag run.
    pub fn trailing_non_options(&self) -> &[String] {
        &self.trailing
    }

    /// Leading followed by trailing non-option tokens.
    pub fn non_options(&self) -> Vec<String> {
        self.leading.iter().chain(&self.trailing).cloned().collect()
    }

    /// Splits into (options, leading, trailing).
    pub fn into_parts(self) -> (OptionMap, Vec<String>, Vec<String>) {
        (self.options, self.leading, self.trailing)
    }
}

/// A recognized flag token, resolved to a schema entry.
#[derive(Debug)]
struct FlagMatch {
    index: usize,
    /// Text after `=`, or the rest of a `-n5` style short token.
    inline: Option<String>,
    negated: bool,
}

/// Parses token lists against a compiled [`OptionSchema`].
///
/// # Examples
///
/// ```
/// use invocation_options::{OptionParser, OptionSchema, ParseMode};
/// use serde_json::json;
///
/// let schema = OptionSchema::compile(json!({
///     "verbose": "boolean",
///     "limit": 10,
/// }).as_object().unwrap()).unwrap();
/// let parser = OptionParser::new(schema);
///
/// let tokens: Vec<String> = ["foo", "-v", "--lim=3", "bar"].iter().map(|s| s.to_string()).collect();
/// let parsed = parser.parse(&tokens, ParseMode::default()).unwrap();
///
/// assert_eq!(parsed.options()["verbose"], json!(true));
/// assert_eq!(parsed.options()["limit"], json!(3));
/// assert_eq!(parsed.leading_non_options(), ["foo"]);
/// assert_eq!(parsed.trailing_non_options(), ["bar"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptionParser {
    schema: OptionSchema,
}

impl OptionParser {
    pub fn new(schema: OptionSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &OptionSchema {
        &self.schema
    }

    /// Parses `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionParseError`] for missing or malformed values,
    /// ambiguous abbreviations, and missing required options.
    pub fn parse(&self, tokens: &[String], mode: ParseMode<'_>) -> Result<ParsedOptions, OptionParseError> {
        let mut options = self.schema.defaults();
        let mut queue: VecDeque<String> = tokens.iter().cloned().collect();
        let mut leading = Vec::new();
        let mut terminated = false;

        while let Some(token) = queue.pop_front() {
            if token == "--" {
                terminated = true;
                break;
            }
            if self.recognize(&token, mode.reserved)?.is_some() {
                queue.push_front(token);
                break;
            }
            leading.push(token);
        }

        while !terminated && let Some(token) = queue.pop_front() {
            if token == "--" {
                terminated = true;
                break;
            }
            let Some(matches) = self.recognize(&token, mode.reserved)? else {
                queue.push_front(token);
                break;
            };
            for flag in matches {
                let spec = self.schema.spec_at(flag.index);
                let value = self.take_value(spec, flag, &mut queue, mode.reserved)?;
                options.insert(spec.name.clone(), value);
            }
        }

        let mut trailing: Vec<String> = queue.into();
        if mode.delete_unrecognized && !terminated {
            trailing = delete_flags(trailing);
        }

        for spec in self.schema.specs() {
            if spec.required && !options.contains_key(&spec.name) {
                return Err(OptionParseError::RequiredMissing(spec.name.clone()));
            }
        }

        Ok(ParsedOptions {
            options,
            leading,
            trailing,
        })
    }

    /// Resolves a token to the flags it names, or `None` when it is not a
    /// flag this schema knows.
    fn recognize(&self, token: &str, reserved: &[&str]) -> Result<Option<Vec<FlagMatch>>, OptionParseError> {
        if let Some(body) = token.strip_prefix("--") {
            if body.is_empty() {
                return Ok(None);
            }
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };
            return Ok(self
                .resolve_long(name, reserved)?
                .map(|(index, negated)| vec![FlagMatch { index, inline, negated }]));
        }

        let Some(body) = token.strip_prefix('-') else {
            return Ok(None);
        };
        if body.is_empty() || is_number(token) {
            return Ok(None);
        }

        if let Some((alias, value)) = body.split_once('=') {
            return Ok(self.schema.position_of_alias(alias).map(|index| {
                vec![FlagMatch {
                    index,
                    inline: Some(value.to_string()),
                    negated: false,
                }]
            }));
        }

        let mut chars = body.char_indices();
        let Some((_, first)) = chars.next() else {
            return Ok(None);
        };
        let Some(first_index) = self.schema.position_of_alias(&first.to_string()) else {
            return Ok(None);
        };
        let rest = &body[first.len_utf8()..];
        if rest.is_empty() {
            return Ok(Some(vec![FlagMatch {
                index: first_index,
                inline: None,
                negated: false,
            }]));
        }

        // `-n5`: value glued to a value-taking short option
        if self.schema.spec_at(first_index).kind != OptionType::Boolean {
            return Ok(Some(vec![FlagMatch {
                index: first_index,
                inline: Some(rest.to_string()),
                negated: false,
            }]));
        }

        // `-abc`: bundle of boolean short options
        let mut bundle = vec![FlagMatch {
            index: first_index,
            inline: None,
            negated: false,
        }];
        for (_, ch) in chars {
            match self.schema.position_of_alias(&ch.to_string()) {
                Some(index) if self.schema.spec_at(index).kind == OptionType::Boolean => {
                    bundle.push(FlagMatch {
                        index,
                        inline: None,
                        negated: false,
                    });
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(bundle))
    }

    /// Resolves a long name: exact match, `no-` negation of a boolean, then
    /// unique prefix unless the name is reserved.
    fn resolve_long(&self, raw: &str, reserved: &[&str]) -> Result<Option<(usize, bool)>, OptionParseError> {
        let name = raw.replace('-', "_");

        if let Some(index) = self.schema.position(&name) {
            return Ok(Some((index, false)));
        }
        if let Some(negated) = name.strip_prefix("no_")
            && let Some(index) = self.schema.position(negated)
            && self.schema.spec_at(index).kind == OptionType::Boolean
        {
            return Ok(Some((index, true)));
        }
        if reserved.contains(&name.as_str()) {
            return Ok(None);
        }

        let candidates: Vec<usize> = self
            .schema
            .specs()
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.name.starts_with(&name))
            .map(|(i, _)| i)
            .collect();
        match candidates.as_slice() {
            [] => Ok(None),
            [index] => Ok(Some((*index, false))),
            many => Err(OptionParseError::AmbiguousOption {
                given: format!("--{raw}"),
                candidates: many
                    .iter()
                    .map(|&i| format!("--{}", self.schema.spec_at(i).name))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn take_value(
        &self,
        spec: &OptionSpec,
        flag: FlagMatch,
        queue: &mut VecDeque<String>,
        reserved: &[&str],
    ) -> Result<Value, OptionParseError> {
        if spec.kind == OptionType::Boolean {
            return match flag.inline.as_deref() {
                None => Ok(Value::Bool(!flag.negated)),
                Some("true") => Ok(Value::Bool(!flag.negated)),
                Some("false") => Ok(Value::Bool(flag.negated)),
                Some(other) => Err(OptionParseError::InvalidBoolean {
                    option: spec.name.clone(),
                    value: other.to_string(),
                }),
            };
        }

        let raw = match flag.inline {
            Some(value) => value,
            None => {
                let next_is_value = match queue.front() {
                    Some(next) => next != "--" && self.recognize(next, reserved)?.is_none(),
                    None => false,
                };
                if !next_is_value {
                    return Err(OptionParseError::MissingValue(spec.name.clone()));
                }
                queue
                    .pop_front()
                    .ok_or_else(|| OptionParseError::MissingValue(spec.name.clone()))?
            }
        };

        match spec.kind {
            OptionType::String => Ok(Value::String(expand_value(spec, &raw)?)),
            OptionType::Numeric => parse_number(&raw).ok_or_else(|| OptionParseError::InvalidNumeric {
                option: spec.name.clone(),
                value: raw.clone(),
            }),
            OptionType::Array => raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| expand_value(spec, item).map(Value::String))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            OptionType::Hash => {
                let mut map = OptionMap::new();
                for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                    let Some((key, value)) = entry.split_once(':') else {
                        return Err(OptionParseError::InvalidHashEntry {
                            option: spec.name.clone(),
                            entry: entry.to_string(),
                        });
                    };
                    map.insert(key.to_string(), Value::String(value.to_string()));
                }
                Ok(Value::Object(map))
            }
            OptionType::Boolean => unreachable!("boolean handled above"),
        }
    }
}

/// Whether `token` looks like a flag rather than a value: a dash followed by
/// something other than a number.
///
/// # Examples
///
/// ```
/// use invocation_options::looks_like_flag;
///
/// assert!(looks_like_flag("--render"));
/// assert!(looks_like_flag("-x"));
/// assert!(!looks_like_flag("-5"));
/// assert!(!looks_like_flag("-"));
/// assert!(!looks_like_flag("plain"));
/// ```
pub fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !is_number(token)
}

/// Removes flag-looking tokens up to a `--` terminator; the terminator is
/// dropped and everything after it is kept verbatim.
fn delete_flags(tokens: Vec<String>) -> Vec<String> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();
    for token in iter.by_ref() {
        if token == "--" {
            break;
        }
        if looks_like_flag(&token) {
            debug!(token = %token, "deleted unrecognized option");
            continue;
        }
        kept.push(token);
    }
    kept.extend(iter);
    kept
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Checks `raw` against the option's allowed values, expanding a unique
/// prefix to the full value.
fn expand_value(spec: &OptionSpec, raw: &str) -> Result<String, OptionParseError> {
    let Some(values) = &spec.values else {
        return Ok(raw.to_string());
    };
    if values.iter().any(|v| v == raw) {
        return Ok(raw.to_string());
    }
    let mut matches = values.iter().filter(|v| v.starts_with(raw));
    match (matches.next(), matches.next()) {
        (Some(only), None) if !raw.is_empty() => Ok(only.clone()),
        _ => Err(OptionParseError::InvalidValue {
            option: spec.name.clone(),
            value: raw.to_string(),
            allowed: values.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parser(schema: Value) -> OptionParser {
        OptionParser::new(OptionSchema::compile(schema.as_object().unwrap()).unwrap())
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_partitions_around_flag_run() {
        let p = parser(json!({"all": "boolean", "name": "string"}));
        let parsed = p
            .parse(&tokens(&["x", "y", "--all", "--name", "n", "z"]), ParseMode::default())
            .unwrap();

        assert_eq!(parsed.leading_non_options(), ["x", "y"]);
        assert_eq!(parsed.trailing_non_options(), ["z"]);
        assert_eq!(parsed.non_options(), vec!["x", "y", "z"]);
        assert_eq!(Value::Object(parsed.options().clone()), json!({"all": true, "name": "n"}));
    }

    #[test]
    fn test_unrecognized_flag_ends_run() {
        let p = parser(json!({"all": "boolean"}));
        let parsed = p
            .parse(&tokens(&["--all", "--bogus", "--all", "x"]), ParseMode::default())
            .unwrap();
        assert_eq!(parsed.trailing_non_options(), ["--bogus", "--all", "x"]);
    }

    #[test]
    fn test_delete_unrecognized_drops_trailing_flags() {
        let p = parser(json!({"all": "boolean"}));
        let parsed = p
            .parse(&tokens(&["--all", "--bogus", "x", "-q", "-3"]), ParseMode::lenient())
            .unwrap();
        assert_eq!(parsed.trailing_non_options(), ["x", "-3"]);
    }

    #[test]
    fn test_unrecognized_leading_flags_stay_in_leading() {
        let p = parser(json!({"all": "boolean"}));
        let parsed = p
            .parse(&tokens(&["--help", "x", "--all"]), ParseMode::lenient())
            .unwrap();
        assert_eq!(parsed.leading_non_options(), ["--help", "x"]);
        assert_eq!(parsed.options()["all"], json!(true));
    }

    #[test]
    fn test_reserved_names_are_not_abbreviated() {
        let p = parser(json!({"helper": "string", "all": "boolean"}));
        let reserved = ["help", "debug"];
        let mode = ParseMode::lenient().with_reserved(&reserved);

        let parsed = p.parse(&tokens(&["--help", "x"]), mode).unwrap();
        assert!(parsed.options().is_empty());
        assert_eq!(parsed.leading_non_options(), ["--help", "x"]);

        let parsed = p.parse(&tokens(&["--hel", "x", "--helper", "y"]), mode).unwrap();
        assert_eq!(parsed.options()["helper"], json!("y"));

        assert!(matches!(
            p.parse(&tokens(&["--help"]), ParseMode::lenient()),
            Err(OptionParseError::MissingValue(name)) if name == "helper"
        ));
    }

    #[test]
    fn test_double_dash_terminates() {
        let p = parser(json!({"all": "boolean"}));
        let parsed = p
            .parse(&tokens(&["--all", "--", "--all", "-x"]), ParseMode::lenient())
            .unwrap();
        assert_eq!(parsed.trailing_non_options(), ["--all", "-x"]);
    }

    #[test]
    fn test_boolean_forms() {
        let p = parser(json!({"render": "boolean", "debug": "boolean"}));
        let parse = |words: &[&str]| p.parse(&tokens(words), ParseMode::default()).unwrap();

        assert_eq!(parse(&["--no-render"]).options()["render"], json!(false));
        assert_eq!(parse(&["--render=false"]).options()["render"], json!(false));
        assert_eq!(parse(&["--no-render=false"]).options()["render"], json!(true));
        let bundled = parse(&["-rd"]);
        assert_eq!(bundled.options()["render"], json!(true));
        assert_eq!(bundled.options()["debug"], json!(true));
    }

    #[test]
    fn test_invalid_boolean_value() {
        let p = parser(json!({"render": "boolean"}));
        assert_eq!(
            p.parse(&tokens(&["--render=maybe"]), ParseMode::default()),
            Err(OptionParseError::InvalidBoolean {
                option: "render".to_string(),
                value: "maybe".to_string()
            })
        );
    }

    #[test]
    fn test_abbreviation_and_dash_normalization() {
        let p = parser(json!({"reverse_sort": "boolean", "render": "boolean"}));
        let parse = |words: &[&str]| p.parse(&tokens(words), ParseMode::default());

        assert_eq!(parse(&["--reverse-sort"]).unwrap().options()["reverse_sort"], json!(true));
        assert_eq!(parse(&["--rev"]).unwrap().options()["reverse_sort"], json!(true));
        assert!(matches!(
            parse(&["--re"]),
            Err(OptionParseError::AmbiguousOption { .. })
        ));
    }

    #[test]
    fn test_value_types() {
        let p = parser(json!({
            "limit": "numeric",
            "ratio": "numeric",
            "fields": "array",
            "env": "hash",
        }));
        let parsed = p
            .parse(
                &tokens(&["--limit", "3", "--ratio=0.5", "--fields", "a, b,", "--env=k:v,x:y"]),
                ParseMode::default(),
            )
            .unwrap();

        assert_eq!(
            Value::Object(parsed.options().clone()),
            json!({"limit": 3, "ratio": 0.5, "fields": ["a", "b"], "env": {"k": "v", "x": "y"}})
        );
    }

    #[test]
    fn test_short_numeric_glued_value() {
        let p = parser(json!({"limit": "numeric"}));
        let parsed = p.parse(&tokens(&["-l5"]), ParseMode::default()).unwrap();
        assert_eq!(parsed.options()["limit"], json!(5));
    }

    #[test]
    fn test_missing_value_errors() {
        let p = parser(json!({"name": "string", "all": "boolean"}));
        assert_eq!(
            p.parse(&tokens(&["--name"]), ParseMode::default()),
            Err(OptionParseError::MissingValue("name".to_string()))
        );
        assert_eq!(
            p.parse(&tokens(&["--name", "--all"]), ParseMode::default()),
            Err(OptionParseError::MissingValue("name".to_string()))
        );
    }

    #[test]
    fn test_invalid_numeric_and_hash() {
        let p = parser(json!({"limit": "numeric", "env": "hash"}));
        assert!(matches!(
            p.parse(&tokens(&["--limit=abc"]), ParseMode::default()),
            Err(OptionParseError::InvalidNumeric { .. })
        ));
        assert!(matches!(
            p.parse(&tokens(&["--env=novalue"]), ParseMode::default()),
            Err(OptionParseError::InvalidHashEntry { .. })
        ));
    }

    #[test]
    fn test_allowed_values_expand_prefix() {
        let p = parser(json!({"as": {"type": "string", "values": ["table", "json", "yaml"]}}));
        let parse = |words: &[&str]| p.parse(&tokens(words), ParseMode::default());

        assert_eq!(parse(&["--as=j"]).unwrap().options()["as"], json!("json"));
        assert!(matches!(
            parse(&["--as=xml"]),
            Err(OptionParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_required_option() {
        let p = parser(json!({"name": {"type": "string", "required": true}}));
        assert_eq!(
            p.parse(&[], ParseMode::default()),
            Err(OptionParseError::RequiredMissing("name".to_string()))
        );
        assert!(p.parse(&tokens(&["--name=x"]), ParseMode::default()).is_ok());
    }

    #[test]
    fn test_defaults_present_without_flags() {
        let p = parser(json!({"limit": 10, "all": "boolean"}));
        let parsed = p.parse(&[], ParseMode::default()).unwrap();
        assert_eq!(Value::Object(parsed.options().clone()), json!({"limit": 10}));
        assert!(parsed.non_options().is_empty());
    }

    #[test]
    fn test_negative_numbers_are_values() {
        let p = parser(json!({"offset": "numeric"}));
        let parsed = p
            .parse(&tokens(&["-4", "--offset", "-2"]), ParseMode::default())
            .unwrap();
        assert_eq!(parsed.leading_non_options(), ["-4"]);
        assert_eq!(parsed.options()["offset"], json!(-2));
    }
}
