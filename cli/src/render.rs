//! Text rendering of command results.

use std::cmp::Ordering;

use invocation_translate::{BoxError, RenderOptions, Renderer};
use serde_json::Value;

use crate::usage::format_table;

/// Output formats selectable with `--as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Renders results into a display string.
///
/// Lists of records are projected onto `fields`, sorted by `sort` and shown
/// as an aligned table with a header row; other values are shown as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, value: Value, options: &RenderOptions) -> Result<Value, BoxError> {
        let format = match options.format.as_deref() {
            None => OutputFormat::default(),
            Some(name) => OutputFormat::from_name(name).ok_or_else(|| format!("unknown output format '{name}'"))?,
        };

        let value = shape(value, options);
        let text = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&value)?,
            OutputFormat::Table => to_table(&value, options),
        };
        Ok(Value::String(text))
    }
}

/// Applies field selection and sorting to lists of records.
fn shape(value: Value, options: &RenderOptions) -> Value {
    let Value::Array(mut rows) = value else {
        return value;
    };

    if let Some(key) = &options.sort {
        rows.sort_by(|a, b| compare(&a[key.as_str()], &b[key.as_str()]));
    }
    if options.reverse_sort {
        rows.reverse();
    }
    if let Some(fields) = &options.fields {
        for row in &mut rows {
            if let Value::Object(record) = row {
                *record = fields
                    .iter()
                    .map(|field| (field.clone(), record.get(field).cloned().unwrap_or(Value::Null)))
                    .collect();
            }
        }
    }
    Value::Array(rows)
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => cell(a).cmp(&cell(b)),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn to_table(value: &Value, options: &RenderOptions) -> String {
    let Value::Array(rows) = value else {
        return cell(value);
    };
    if !rows.iter().all(Value::is_object) {
        return rows.iter().map(cell).collect::<Vec<_>>().join("\n");
    }

    let headers: Vec<String> = match &options.fields {
        Some(fields) => fields.clone(),
        None => rows
            .first()
            .and_then(Value::as_object)
            .map(|record| record.keys().cloned().collect())
            .unwrap_or_default(),
    };

    let mut table = vec![headers.clone()];
    table.extend(
        rows.iter()
            .map(|row| headers.iter().map(|field| cell(&row[field.as_str()])).collect()),
    );
    let mut out = format_table(&table);
    out.push_str(&format!("\n{} rows in set", rows.len()));
    out
}
