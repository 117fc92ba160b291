//! Render gate and renderer seam.

use invocation_core::CommandDescriptor;
use serde_json::Value;

use crate::error::BoxError;
use crate::globals::{GlobalOptions, RenderOptions};

/// Decides whether a command's result goes through the renderer.
///
/// Render-aware commands (those with custom render options) render unless
/// the caller passed `--render=false`; every other command renders only
/// when the caller passed `--render`.
///
/// # Examples
///
/// ```
/// use invocation_core::CommandDescriptor;
/// use invocation_translate::{GlobalOptions, should_render};
/// use serde_json::json;
///
/// let plain = CommandDescriptor::new("status");
/// let render = GlobalOptions::from_map(json!({"render": true}).as_object().unwrap().clone());
/// assert!(!should_render(&plain, &GlobalOptions::default()));
/// assert!(should_render(&plain, &render));
/// ```
pub fn should_render(command: &CommandDescriptor, globals: &GlobalOptions) -> bool {
    if command.is_render_aware() {
        globals.render() != Some(false)
    } else {
        globals.render() == Some(true)
    }
}

/// Formats a command result for display.
pub trait Renderer {
    fn render(&self, value: Value, options: &RenderOptions) -> Result<Value, BoxError>;
}

impl<F> Renderer for F
where
    F: Fn(Value, &RenderOptions) -> Result<Value, BoxError>,
{
    fn render(&self, value: Value, options: &RenderOptions) -> Result<Value, BoxError> {
        self(value, options)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn globals(render: Option<bool>) -> GlobalOptions {
        let map = match render {
            Some(flag) => json!({ "render": flag }),
            None => json!({}),
        };
        GlobalOptions::from_map(map.as_object().cloned().unwrap())
    }

    #[test]
    fn test_render_gate_matrix() {
        let plain = CommandDescriptor::new("plain").with_options(Default::default());
        let aware = CommandDescriptor::new("aware").with_render_options(Default::default());

        let cases = [
            (&plain, None, false),
            (&plain, Some(true), true),
            (&plain, Some(false), false),
            (&aware, None, true),
            (&aware, Some(true), true),
            (&aware, Some(false), false),
        ];
        for (command, render, expected) in cases {
            assert_eq!(
                should_render(command, &globals(render)),
                expected,
                "{} with render={render:?}",
                command.name
            );
        }
    }

    #[test]
    fn test_closure_renderer() {
        let renderer = |value: Value, options: &RenderOptions| -> Result<Value, BoxError> {
            Ok(json!({ "value": value, "as": options.format }))
        };
        let options = RenderOptions {
            format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(
            renderer.render(json!(1), &options).unwrap(),
            json!({"value": 1, "as": "json"})
        );
    }
}
