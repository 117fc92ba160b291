//! Built-in commands of the `invoke` binary.

use invocation_core::{CommandDescriptor, OptionMap, Parameter};
use invocation_translate::{BoxError, Registry, RegistryError, abbreviation_search};
use serde_json::{Value, json};

use crate::session::Session;
use crate::usage::usage_text;

fn schema(value: Value) -> OptionMap {
    match value {
        Value::Object(map) => map,
        _ => OptionMap::new(),
    }
}

pub fn commands_descriptor() -> CommandDescriptor {
    CommandDescriptor::new("commands")
        .with_alias("c")
        .with_description("List commands, optionally filtered by an abbreviation")
        .with_parameter(Parameter::optional("query", json!("")))
        .with_parameter(Parameter::optional("options", json!({})))
        .with_options(schema(json!({"full": "boolean"})))
        .with_render_options(schema(json!({
            "fields": {"default": ["name", "alias", "description"]},
        })))
}

pub fn echo_descriptor() -> CommandDescriptor {
    CommandDescriptor::new("echo")
        .with_description("Print words")
        .with_parameter(Parameter::splat("words"))
        .with_parameter(Parameter::optional("options", json!({})))
        .with_options(schema(json!({
            "upcase": "boolean",
            "separator": {"type": "string", "default": " "},
        })))
}

pub fn greet_descriptor() -> CommandDescriptor {
    CommandDescriptor::new("greet")
        .with_description("Greet someone, by default the current user")
        .with_parameter(Parameter::optional("name", json!("$user")))
        .with_parameter(Parameter::optional("options", json!({})))
        .with_options(schema(json!({"shout": "boolean"})))
        .with_contextual_defaults()
}

pub fn usage_descriptor() -> CommandDescriptor {
    CommandDescriptor::new("usage")
        .with_description("Show usage for a command")
        .with_parameter(Parameter::required("command"))
}

/// Registers every built-in command.
pub fn register_all(registry: &mut Registry<Session>) -> Result<(), RegistryError> {
    registry.register(commands_descriptor(), list_commands)?;
    registry.register(echo_descriptor(), echo)?;
    registry.register(greet_descriptor(), greet)?;
    registry.register(usage_descriptor(), usage)?;
    Ok(())
}

/// Splits off the trailing options mapping.
fn split_options(mut args: Vec<Value>) -> (Vec<Value>, OptionMap) {
    match args.pop() {
        Some(Value::Object(options)) => (args, options),
        Some(other) => {
            args.push(other);
            (args, OptionMap::new())
        }
        None => (args, OptionMap::new()),
    }
}

fn flag(options: &OptionMap, name: &str) -> bool {
    options.get(name).and_then(Value::as_bool).unwrap_or(false)
}

fn list_commands(session: &Session, args: Vec<Value>) -> Result<Value, BoxError> {
    let (positional, options) = split_options(args);
    let query = positional.first().and_then(Value::as_str).unwrap_or("");
    let full = flag(&options, "full");

    let catalog = session.catalog();
    let matched = abbreviation_search(query, catalog.iter().map(|descriptor| descriptor.name.as_str()));
    let rows = catalog
        .iter()
        .filter(|descriptor| query.is_empty() || matched.contains(&descriptor.name.as_str()))
        .map(|descriptor| {
            let mut row = json!({
                "name": descriptor.name,
                "alias": descriptor.alias,
                "description": descriptor.description,
            });
            if full {
                row["usage"] = json!(descriptor.usage_line());
            }
            row
        })
        .collect();
    Ok(Value::Array(rows))
}

fn echo(_: &Session, args: Vec<Value>) -> Result<Value, BoxError> {
    let (words, options) = split_options(args);
    let separator = options.get("separator").and_then(Value::as_str).unwrap_or(" ");
    let text = words
        .iter()
        .map(|word| match word {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator);
    if flag(&options, "upcase") {
        return Ok(json!(text.to_uppercase()));
    }
    Ok(json!(text))
}

fn greet(_: &Session, args: Vec<Value>) -> Result<Value, BoxError> {
    let (positional, options) = split_options(args);
    let name = match positional.first() {
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => return Err("nobody to greet".into()),
    };
    let greeting = format!("Hello, {name}!");
    if flag(&options, "shout") {
        return Ok(json!(greeting.to_uppercase()));
    }
    Ok(json!(greeting))
}

fn usage(session: &Session, args: Vec<Value>) -> Result<Value, BoxError> {
    let name = args.first().and_then(Value::as_str).ok_or("usage needs a command name")?;
    let descriptor = session
        .describe(name)
        .ok_or_else(|| format!("command {name} not found"))?;
    Ok(json!(usage_text(descriptor)?))
}
