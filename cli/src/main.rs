mod builtins;
mod config;
mod render;
mod session;
mod usage;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use invocation_options::join;
use invocation_translate::{Dispatched, Dispatcher, Registry};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::InvokeConfig;
use crate::render::TextRenderer;
use crate::session::Session;
use crate::usage::UsagePrinter;

#[derive(Debug, Parser)]
#[command(name = "invoke")]
#[command(version, about = "Run commands with shell-style arguments and options")]
struct Cli {
    /// Path to a YAML config (default: .invoke.yml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log translation and dispatch decisions to stderr.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    invocation: Invocation,
}

#[derive(Debug, Subcommand)]
enum Invocation {
    /// Any registered command, followed by its arguments and options.
    #[command(external_subcommand)]
    Command(Vec<String>),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Returns whether the command succeeded; its failures are already reported.
fn run(cli: Cli) -> Result<bool, String> {
    let Invocation::Command(words) = cli.invocation;
    let Some((name, args)) = words.split_first() else {
        return Err("no command given".to_string());
    };

    let cwd = std::env::current_dir().map_err(|err| format!("Failed to read working directory: {err}"))?;
    let config = InvokeConfig::resolve(cli.config.as_deref(), &cwd).map_err(|err| err.to_string())?;

    let mut registry = Registry::new();
    builtins::register_all(&mut registry).map_err(|err| err.to_string())?;
    config.apply(&mut registry).map_err(|err| err.to_string())?;

    let session = Session::new(config.variables.clone()).with_catalog(registry.descriptors().cloned());
    let usage = UsagePrinter::new(registry.descriptors().cloned());

    let takes_options = registry
        .find(name)
        .is_some_and(|entry| entry.descriptor.accepts_options());
    let raw_args: Vec<Value> = if takes_options {
        // one string, so the translator splits and parses it
        vec![Value::String(join(args))]
    } else {
        args.iter().cloned().map(Value::String).collect()
    };
    debug!(command = %name, args = ?raw_args, "invoking");

    let dispatcher = Dispatcher::new(registry, usage, TextRenderer);
    match dispatcher.try_invoke(&session, name, raw_args) {
        Ok(Dispatched::Usage) => Ok(true),
        Ok(Dispatched::Rendered(value) | Dispatched::Returned(value)) => {
            print_value(&value)?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

fn print_value(value: &Value) -> Result<(), String> {
    match value {
        Value::Null => {}
        Value::String(text) => println!("{text}"),
        other => {
            let text =
                serde_json::to_string_pretty(other).map_err(|err| format!("Failed to serialize result: {err}"))?;
            println!("{text}");
        }
    }
    Ok(())
}
