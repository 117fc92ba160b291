//! Dispatch table: command descriptors and their handlers.

use std::collections::{BTreeMap, BTreeSet};

use invocation_core::{CommandDescriptor, DescriptorOverlay, ValidationError, apply_overlay, validate_descriptor};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{BoxError, RegistryError};

/// Command body. Receives the invocation target and the translated arguments.
pub type Handler<T> = Box<dyn Fn(&T, Vec<Value>) -> Result<Value, BoxError> + Send + Sync>;

/// A registered command.
pub struct Entry<T> {
    pub descriptor: CommandDescriptor,
    pub handler: Handler<T>,
}

impl<T> std::fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Commands keyed by name, iterated in name order.
pub struct Registry<T> {
    entries: BTreeMap<String, Entry<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command.
    ///
    /// # Errors
    ///
    /// Fails when the descriptor is invalid or its name or alias collides
    /// with a registered command.
    pub fn register<F>(&mut self, descriptor: CommandDescriptor, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&T, Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        if let Some(error) = validate_descriptor(&descriptor).into_iter().next() {
            return Err(error.into());
        }
        self.check_collisions(&descriptor, None)?;

        debug!(command = %descriptor.name, "registered command");
        self.entries.insert(
            descriptor.name.clone(),
            Entry {
                descriptor,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Looks up a command by exact name or alias.
    pub fn get(&self, name: &str) -> Option<&Entry<T>> {
        self.entries
            .get(name)
            .or_else(|| self.entries.values().find(|entry| entry.descriptor.matches(name)))
    }

    /// Looks up a command by name, alias, or unambiguous abbreviation.
    pub fn find(&self, query: &str) -> Option<&Entry<T>> {
        if let Some(entry) = self.get(query) {
            return Some(entry);
        }
        match self.search(query).as_slice() {
            [name] => self.entries.get(*name),
            _ => None,
        }
    }

    /// Registered names matching an abbreviation; see [`abbreviation_search`].
    pub fn search(&self, query: &str) -> Vec<&str> {
        abbreviation_search(query, self.entries.keys().map(String::as_str))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.entries.values().map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names registered right now.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot(self.entries.keys().cloned().collect())
    }

    /// Customizes a registered command in place.
    ///
    /// # Errors
    ///
    /// Fails for unknown commands and when the customized descriptor would
    /// be invalid or collide with another command.
    pub fn apply_overlay(&mut self, name: &str, overlay: &DescriptorOverlay) -> Result<(), RegistryError> {
        let current = self
            .get(name)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| RegistryError::UnknownCommand(name.to_string()))?;

        let updated = apply_overlay(&current, overlay);
        if let Some(error) = validate_descriptor(&updated).into_iter().next() {
            return Err(error.into());
        }
        self.check_collisions(&updated, Some(&current.name))?;

        if let Some(entry) = self.entries.get_mut(&current.name) {
            debug!(command = %current.name, "applied descriptor overlay");
            entry.descriptor = updated;
        }
        Ok(())
    }

    fn check_collisions(&self, descriptor: &CommandDescriptor, replacing: Option<&str>) -> Result<(), RegistryError> {
        let clash = self
            .descriptors()
            .filter(|existing| Some(existing.name.as_str()) != replacing)
            .find(|existing| {
                existing.matches(&descriptor.name)
                    || descriptor
                        .alias
                        .as_deref()
                        .is_some_and(|alias| existing.matches(alias))
            });
        match clash {
            Some(existing) => Err(ValidationError::DuplicateCommand(existing.name.clone()).into()),
            None => Ok(()),
        }
    }
}

/// Names matching an abbreviation.
///
/// An exact name is the only match. Underscore-separated queries match word
/// by word, so `s_d_l_w` finds `some_dang_long_word`; other queries match as
/// prefixes.
///
/// # Examples
///
/// ```
/// use invocation_translate::abbreviation_search;
///
/// let names = ["some_dang_long_word", "some_other", "status"];
/// assert_eq!(abbreviation_search("s_d_l_w", names), vec!["some_dang_long_word"]);
/// assert_eq!(abbreviation_search("so", names), vec!["some_dang_long_word", "some_other"]);
/// ```
pub fn abbreviation_search<'a>(query: &str, names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let names: Vec<&str> = names.into_iter().collect();
    if let Some(exact) = names.iter().find(|name| **name == query) {
        return vec![*exact];
    }
    let body = query
        .split('_')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("([^_]+)?_");
    let Ok(pattern) = Regex::new(&format!("^{body}")) else {
        return Vec::new();
    };
    names.into_iter().filter(|name| pattern.is_match(name)).collect()
}

/// Registered names at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot(BTreeSet<String>);

impl RegistrySnapshot {
    /// Names present now but not in `before`.
    pub fn added_since(&self, before: &RegistrySnapshot) -> Vec<String> {
        self.0.difference(&before.0).cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn registry(names: &[&str]) -> Registry<()> {
        let mut registry = Registry::new();
        for name in names {
            registry
                .register(CommandDescriptor::new(name), |_: &(), _| Ok(Value::Null))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_underscore_abbreviation() {
        let registry = registry(&["some_dang_long_word", "some_other", "status"]);

        assert_eq!(registry.search("s_d_l_w"), vec!["some_dang_long_word"]);
        assert_eq!(registry.search("so"), vec!["some_dang_long_word", "some_other"]);
        assert_eq!(registry.search("st"), vec!["status"]);
        assert!(registry.search("x").is_empty());

        assert_eq!(registry.find("s_d").unwrap().descriptor.name, "some_dang_long_word");
        assert!(registry.find("so").is_none());
    }

    #[test]
    fn test_regex_characters_are_literal() {
        let registry = registry(&["a.b", "axb"]);
        assert_eq!(registry.search("a."), vec!["a.b"]);
    }

    #[test]
    fn test_get_by_alias() {
        let mut registry = registry(&[]);
        registry
            .register(CommandDescriptor::new("commands").with_alias("c"), |_: &(), _| {
                Ok(json!([]))
            })
            .unwrap();
        assert_eq!(registry.get("c").unwrap().descriptor.name, "commands");
        assert!(registry.get("com").is_none());
        assert_eq!(registry.find("com").unwrap().descriptor.name, "commands");
    }

    #[test]
    fn test_duplicate_names_and_aliases_rejected() {
        let mut registry = registry(&["status"]);
        let err = registry
            .register(CommandDescriptor::new("status"), |_: &(), _| Ok(Value::Null))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));

        let err = registry
            .register(CommandDescriptor::new("stat").with_alias("status"), |_: &(), _| {
                Ok(Value::Null)
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "duplicate command name or alias: status");
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let mut registry = registry(&[]);
        let err = registry
            .register(CommandDescriptor::new("bad").with_options(Default::default()), |_: &(), _| {
                Ok(Value::Null)
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_added_since() {
        let mut registry = registry(&["a"]);
        let before = registry.snapshot();
        registry
            .register(CommandDescriptor::new("b"), |_: &(), _| Ok(Value::Null))
            .unwrap();
        let after = registry.snapshot();

        assert_eq!(after.added_since(&before), vec!["b".to_string()]);
        assert!(before.added_since(&after).is_empty());
        assert!(after.contains("a"));
    }

    #[test]
    fn test_overlay_updates_descriptor() {
        let mut registry = registry(&["status"]);
        let overlay = DescriptorOverlay {
            alias: Some("st".to_string()),
            description: Some("Show status".to_string()),
            ..Default::default()
        };
        registry.apply_overlay("status", &overlay).unwrap();

        let entry = registry.get("st").unwrap();
        assert_eq!(entry.descriptor.description.as_deref(), Some("Show status"));

        let err = registry.apply_overlay("missing", &overlay).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCommand(_)));
    }
}
