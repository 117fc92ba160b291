//! The invocation-global option set.
//!
//! Global options are recognized for every command regardless of its own
//! schema: `help`, `render`, `debug`, `global` (a string carrying more
//! global flags) and the rendering keys `fields`, `sort`, `as`,
//! `reverse_sort`. The key set is closed; anything else is dropped.

use invocation_core::OptionMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Keys forwarded to the renderer.
pub const RENDER_KEYS: [&str; 4] = ["fields", "sort", "as", "reverse_sort"];

/// Every recognized global key.
pub const GLOBAL_KEYS: [&str; 8] = [
    "help",
    "render",
    "debug",
    "global",
    "fields",
    "sort",
    "as",
    "reverse_sort",
];

/// Schema every command's global parser starts from. Commands with custom
/// render options merge theirs over this.
pub fn default_global_schema() -> OptionMap {
    [
        ("help", json!("boolean")),
        ("render", json!("boolean")),
        ("debug", json!("boolean")),
        ("global", json!("string")),
        ("fields", json!({"type": "array"})),
        ("sort", json!({"type": "string"})),
        ("as", json!("string")),
        ("reverse_sort", json!("boolean")),
    ]
    .into_iter()
    .map(|(name, spec)| (name.to_string(), spec))
    .collect()
}

/// Global options of one invocation.
///
/// # Examples
///
/// ```
/// use invocation_translate::GlobalOptions;
/// use serde_json::json;
///
/// let globals = GlobalOptions::from_map(
///     json!({"render": false, "as": "json", "bogus": 1}).as_object().unwrap().clone(),
/// );
/// assert_eq!(globals.render(), Some(false));
/// assert!(globals.get("bogus").is_none());
/// assert_eq!(globals.render_options().format.as_deref(), Some("json"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalOptions(OptionMap);

impl GlobalOptions {
    /// Keeps only recognized global keys.
    pub fn from_map(map: OptionMap) -> Self {
        Self(
            map.into_iter()
                .filter(|(key, _)| GLOBAL_KEYS.contains(&key.as_str()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &OptionMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn help(&self) -> bool {
        self.flag("help") == Some(true)
    }

    pub fn debug(&self) -> bool {
        self.flag("debug") == Some(true)
    }

    /// The explicit render choice; `None` when the caller said nothing.
    pub fn render(&self) -> Option<bool> {
        self.flag("render")
    }

    /// The nested `global` flag string.
    pub fn global(&self) -> Option<&str> {
        self.0.get("global").and_then(Value::as_str)
    }

    /// Projection onto the rendering keys.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            fields: self.0.get("fields").and_then(Value::as_array).map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            }),
            sort: self.0.get("sort").and_then(Value::as_str).map(String::from),
            format: self.0.get("as").and_then(Value::as_str).map(String::from),
            reverse_sort: self.flag("reverse_sort").unwrap_or(false),
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }
}

/// Options handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Fields (columns) to show, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Field to sort rows by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Output format name.
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Reverse the sort order.
    #[serde(default)]
    pub reverse_sort: bool,
}
