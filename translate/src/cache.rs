//! Compiled option-parser cache.
//!
//! Compiling a schema is done once per command: the command-local parser
//! from the descriptor's `options`, and the global parser from the default
//! global schema (shared by every command without custom render options) or
//! that schema with the command's `render_options` merged over it. Entries
//! are keyed by the schema contents, so a descriptor changed by an overlay
//! gets a freshly compiled parser instead of a stale one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use invocation_core::{CommandDescriptor, OptionMap, recursive_merge};
use invocation_options::{OptionParser, OptionSchema, SchemaError};
use serde_json::Value;
use tracing::debug;

use crate::globals::default_global_schema;

type ParserMap<K> = Mutex<HashMap<K, Arc<OptionParser>>>;

/// Lazily filled parser cache, safe to share between threads.
#[derive(Debug, Default)]
pub struct ParserCache {
    /// Command name and serialized option schema.
    commands: ParserMap<(String, String)>,
    /// Serialized custom render options; `None` keys the default global parser.
    globals: ParserMap<Option<String>>,
}

impl ParserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser for the command's own options.
    pub fn command_parser(&self, command: &CommandDescriptor) -> Result<Arc<OptionParser>, SchemaError> {
        let options = command.options.clone().unwrap_or_default();
        let key = (command.name.clone(), schema_key(&options));
        get_or_compile(&self.commands, key, || options)
    }

    /// Parser for global options as this command sees them.
    pub fn global_parser(&self, command: &CommandDescriptor) -> Result<Arc<OptionParser>, SchemaError> {
        match &command.render_options {
            Some(custom) => get_or_compile(&self.globals, Some(schema_key(custom)), || {
                recursive_merge(&default_global_schema(), custom)
            }),
            None => get_or_compile(&self.globals, None, default_global_schema),
        }
    }

    /// Number of compiled parsers held.
    pub fn len(&self) -> usize {
        lock(&self.commands).len() + lock(&self.globals).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn schema_key(schema: &OptionMap) -> String {
    Value::Object(schema.clone()).to_string()
}

fn lock<K>(map: &ParserMap<K>) -> std::sync::MutexGuard<'_, HashMap<K, Arc<OptionParser>>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

fn get_or_compile<K>(
    map: &ParserMap<K>,
    key: K,
    schema: impl FnOnce() -> OptionMap,
) -> Result<Arc<OptionParser>, SchemaError>
where
    K: std::hash::Hash + Eq + std::fmt::Debug,
{
    let mut parsers = lock(map);
    if let Some(parser) = parsers.get(&key) {
        return Ok(Arc::clone(parser));
    }
    let parser = Arc::new(OptionParser::new(OptionSchema::compile(&schema())?));
    debug!(key = ?key, options = parser.schema().specs().len(), "compiled option parser");
    parsers.insert(key, Arc::clone(&parser));
    Ok(parser)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn command(name: &str) -> CommandDescriptor {
        CommandDescriptor::new(name).with_options(json!({"all": "boolean"}).as_object().cloned().unwrap())
    }

    #[test]
    fn test_parsers_are_memoized() {
        let cache = ParserCache::new();
        let cmd = command("list");

        let first = cache.command_parser(&cmd).unwrap();
        let second = cache.command_parser(&cmd).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_default_global_parser_is_shared() {
        let cache = ParserCache::new();
        let a = cache.global_parser(&command("a")).unwrap();
        let b = cache.global_parser(&command("b")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_custom_render_options_merge_over_defaults() {
        let cache = ParserCache::new();
        let cmd = command("list").with_render_options(
            json!({"fields": {"default": ["name"]}}).as_object().cloned().unwrap(),
        );

        let parser = cache.global_parser(&cmd).unwrap();
        let fields = parser.schema().get("fields").unwrap();
        assert_eq!(fields.default, Some(json!(["name"])));
        assert!(parser.schema().get("help").is_some());

        let default = cache.global_parser(&command("other")).unwrap();
        assert!(!Arc::ptr_eq(&parser, &default));
    }

    #[test]
    fn test_changed_options_compile_a_new_parser() {
        let cache = ParserCache::new();
        let before = cache.command_parser(&command("list")).unwrap();

        let changed = CommandDescriptor::new("list").with_options(json!({"limit": 5}).as_object().cloned().unwrap());
        let after = cache.command_parser(&changed).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.schema().get("limit").is_some());
        assert!(Arc::ptr_eq(&after, &cache.command_parser(&changed).unwrap()));
    }

    #[test]
    fn test_schema_errors_are_not_cached() {
        let cache = ParserCache::new();
        let cmd = CommandDescriptor::new("bad")
            .with_options(json!({"x": {"type": "date"}}).as_object().cloned().unwrap());
        assert!(cache.command_parser(&cmd).is_err());
        assert!(cache.is_empty());
    }
}
