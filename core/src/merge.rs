//! Recursive option-schema merging.
//!
//! Command descriptors customize the default global schema by overlaying
//! their own mapping on top of it. Nested mappings merge key by key so a
//! command can change one attribute of an option (say its default) without
//! restating the rest.
//!
//! # Example
//!
//! ```
//! use invocation_core::recursive_merge;
//! use serde_json::json;
//!
//! let base = json!({"fields": {"type": "array"}, "sort": "string"});
//! let overlay = json!({"fields": {"default": ["name"]}});
//!
//! let merged = recursive_merge(base.as_object().unwrap(), overlay.as_object().unwrap());
//! assert_eq!(
//!     serde_json::Value::Object(merged),
//!     json!({"fields": {"type": "array", "default": ["name"]}, "sort": "string"})
//! );
//! ```

use serde_json::Value;

use crate::{CommandDescriptor, DescriptorOverlay, OptionMap};

/// Merges `overlay` into `base`, recursing into values that are mappings on
/// both sides.
///
/// Keys only in `base` are kept, keys only in `overlay` are added, and for
/// keys present in both a non-mapping overlay value replaces the base value.
/// Key order follows `base`, with new overlay keys appended.
///
/// # Examples
///
/// ```
/// use invocation_core::recursive_merge;
/// use serde_json::json;
///
/// let merged = recursive_merge(
///     json!({"a": 1}).as_object().unwrap(),
///     json!({"a": 2}).as_object().unwrap(),
/// );
/// assert_eq!(merged["a"], json!(2));
/// ```
pub fn recursive_merge(base: &OptionMap, overlay: &OptionMap) -> OptionMap {
    let mut merged = base.clone();

    for (key, value) in overlay {
        let combined = match (merged.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                Value::Object(recursive_merge(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }

    merged
}

/// Applies a [`DescriptorOverlay`] to a descriptor.
///
/// Alias and description are replaced when set. Option schemas merge
/// recursively into the existing schema; when the descriptor had none, the
/// overlay schema is adopted as-is.
///
/// # Examples
///
/// ```
/// use invocation_core::*;
/// use serde_json::json;
///
/// let cmd = CommandDescriptor::new("list")
///     .with_render_options(json!({"fields": {"default": ["name"]}}).as_object().unwrap().clone());
/// let overlay = DescriptorOverlay {
///     alias: Some("ls".into()),
///     render_options: Some(json!({"sort": {"default": "name"}}).as_object().unwrap().clone()),
///     ..Default::default()
/// };
///
/// let merged = apply_overlay(&cmd, &overlay);
/// assert_eq!(merged.alias.as_deref(), Some("ls"));
/// let render = merged.render_options.unwrap();
/// assert!(render.contains_key("fields"));
/// assert!(render.contains_key("sort"));
/// ```
pub fn apply_overlay(base: &CommandDescriptor, overlay: &DescriptorOverlay) -> CommandDescriptor {
    let mut merged = base.clone();

    if let Some(alias) = &overlay.alias {
        merged.alias = Some(alias.clone());
    }
    if let Some(description) = &overlay.description {
        merged.description = Some(description.clone());
    }
    merged.options = merge_optional(&base.options, &overlay.options);
    merged.render_options = merge_optional(&base.render_options, &overlay.render_options);

    merged
}

fn merge_optional(base: &Option<OptionMap>, overlay: &Option<OptionMap>) -> Option<OptionMap> {
    match (base, overlay) {
        (Some(base), Some(overlay)) => Some(recursive_merge(base, overlay)),
        (None, Some(overlay)) => Some(overlay.clone()),
        (base, None) => base.clone(),
    }
}
