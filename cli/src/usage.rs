//! Usage text for commands.

use std::io::Write;

use invocation_core::{CommandDescriptor, recursive_merge};
use invocation_options::{OptionSchema, SchemaError};
use invocation_translate::{Usage, default_global_schema};

/// Left-aligns rows into columns separated by two spaces, each line
/// indented by two spaces. Trailing padding is trimmed.
pub fn format_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in rows {
        let mut line = String::from(" ");
        for (cell, width) in row.iter().zip(&widths) {
            line.push_str(&format!(" {cell:<width$} "));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Full usage text: signature, description, then the command's options and
/// the global options it accepts.
pub fn usage_text(command: &CommandDescriptor) -> Result<String, SchemaError> {
    let mut out = format!("Usage: {}\n", command.usage_line());
    if let Some(alias) = &command.alias {
        out.push_str(&format!("Alias: {alias}\n"));
    }
    if let Some(description) = &command.description {
        out.push_str(&format!("\n  {description}\n"));
    }
    if !command.accepts_options() {
        return Ok(out);
    }

    if let Some(options) = &command.options {
        let schema = OptionSchema::compile(options)?;
        if !schema.is_empty() {
            out.push_str("\nOptions:\n");
            out.push_str(&format_table(&option_rows(&schema)));
        }
    }

    let globals = match &command.render_options {
        Some(custom) => recursive_merge(&default_global_schema(), custom),
        None => default_global_schema(),
    };
    out.push_str("\nGlobal options:\n");
    out.push_str(&format_table(&option_rows(&OptionSchema::compile(&globals)?)));
    Ok(out)
}

fn option_rows(schema: &OptionSchema) -> Vec<Vec<String>> {
    schema
        .specs()
        .iter()
        .map(|spec| vec![spec.flags_label(), spec.detail_label()])
        .collect()
}

/// Prints usage to stdout on `--help`.
#[derive(Debug, Clone, Default)]
pub struct UsagePrinter {
    commands: Vec<CommandDescriptor>,
}

impl UsagePrinter {
    pub fn new(commands: impl IntoIterator<Item = CommandDescriptor>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }
}

impl Usage for UsagePrinter {
    fn show_usage(&self, command: &str) {
        let text = match self.commands.iter().find(|descriptor| descriptor.matches(command)) {
            Some(descriptor) => usage_text(descriptor).unwrap_or_else(|err| format!("Usage: {command}\n({err})\n")),
            None => format!("Usage: {command}\n"),
        };
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
    }
}
