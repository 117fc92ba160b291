//! The dispatch wrapper around command bodies.
//!
//! [`Dispatcher::call`] is what every registered command goes through:
//! translate the raw arguments, honour the help escape, run the body, then
//! pass its result through the render gate. [`Dispatcher::invoke`] adds the
//! outermost error boundary used by front ends.

use std::error::Error;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::info;

use crate::error::{DispatchError, TranslateError};
use crate::globals::GlobalOptions;
use crate::registry::Registry;
use crate::render::{Renderer, should_render};
use crate::translator::{Target, Translation, Translator};

/// Shows usage for a command; called on `--help`.
pub trait Usage {
    fn show_usage(&self, command: &str);
}

impl<F> Usage for F
where
    F: Fn(&str),
{
    fn show_usage(&self, command: &str) {
        self(command)
    }
}

/// What a dispatched call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// The body's result, unrendered.
    Returned(Value),
    /// The body's result after the renderer.
    Rendered(Value),
    /// Help was requested and usage was shown instead.
    Usage,
}

impl Dispatched {
    /// The result value; `None` for [`Dispatched::Usage`].
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Returned(value) | Self::Rendered(value) => Some(value),
            Self::Usage => None,
        }
    }
}

type Diagnostics = Mutex<Box<dyn Write + Send>>;

/// Routes calls through translation, the command body and rendering.
pub struct Dispatcher<T, U, R> {
    registry: Registry<T>,
    translator: Translator,
    usage: U,
    renderer: R,
    diagnostics: Diagnostics,
}

impl<T, U, R> Dispatcher<T, U, R>
where
    T: Target,
    U: Usage,
    R: Renderer,
{
    /// Diagnostics go to stderr until replaced with
    /// [`with_diagnostics`](Self::with_diagnostics).
    pub fn new(registry: Registry<T>, usage: U, renderer: R) -> Self {
        Self {
            registry,
            translator: Translator::new(),
            usage,
            renderer,
            diagnostics: Mutex::new(Box::new(io::stderr())),
        }
    }

    /// Redirects `Debug:` echoes and error reports.
    pub fn with_diagnostics(mut self, writer: impl Write + Send + 'static) -> Self {
        self.diagnostics = Mutex::new(Box::new(writer));
        self
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<T> {
        &mut self.registry
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Runs a command.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownCommand`] for names the registry does not
    /// resolve, [`DispatchError::Translate`] for translation and render
    /// failures, [`DispatchError::Command`] when the body fails.
    pub fn call(&self, target: &T, name: &str, args: Vec<Value>) -> Result<Dispatched, DispatchError> {
        let mut globals = GlobalOptions::default();
        self.call_with(target, name, args, &mut globals)
    }

    /// Runs a command, reporting failures to the diagnostic writer.
    ///
    /// Prints `Error: <message>`, followed by the cause chain when the call
    /// asked for `--debug`. Returns the result value on success.
    pub fn invoke(&self, target: &T, name: &str, args: Vec<Value>) -> Option<Value> {
        self.try_invoke(target, name, args)
            .ok()
            .and_then(Dispatched::into_value)
    }

    /// Like [`invoke`](Self::invoke), but hands back the already reported
    /// error so front ends can pick an exit status.
    pub fn try_invoke(&self, target: &T, name: &str, args: Vec<Value>) -> Result<Dispatched, DispatchError> {
        let mut globals = GlobalOptions::default();
        self.call_with(target, name, args, &mut globals).inspect_err(|err| {
            info!(command = name, error = %err, "command failed");
            self.diagnose(|out| report_error(out, err, globals.debug()));
        })
    }

    fn diagnose(&self, write: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        let mut out = self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner);
        // nowhere left to report a failing diagnostic stream
        let _ = write(&mut **out);
    }

    fn call_with(
        &self,
        target: &T,
        name: &str,
        args: Vec<Value>,
        globals: &mut GlobalOptions,
    ) -> Result<Dispatched, DispatchError> {
        let entry = self
            .registry
            .find(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;
        let command = &entry.descriptor;

        let parsed = match self.translator.translate_into(target, command, args, globals)? {
            Translation::Help(_) => {
                info!(command = %command.name, "showing usage");
                self.usage.show_usage(&command.name);
                return Ok(Dispatched::Usage);
            }
            Translation::Ready(parsed) => parsed,
        };

        if parsed.globals.debug() {
            let echoed = serde_json::to_string(&parsed.args).unwrap_or_default();
            self.diagnose(|out| writeln!(out, "Debug: {echoed}"));
        }

        info!(command = %command.name, args = parsed.args.len(), "dispatching");
        let result = (entry.handler)(target, parsed.args).map_err(|source| DispatchError::Command {
            command: command.name.clone(),
            source,
        })?;

        if should_render(command, &parsed.globals) {
            let rendered = self
                .renderer
                .render(result, &parsed.globals.render_options())
                .map_err(TranslateError::wrap)?;
            return Ok(Dispatched::Rendered(rendered));
        }
        Ok(Dispatched::Returned(result))
    }
}

impl<T, U, R> std::fmt::Debug for Dispatcher<T, U, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("translator", &self.translator)
            .finish_non_exhaustive()
    }
}

/// Writes an error report: the message, then with `debug` each distinct
/// cause and the error's debug form.
pub fn report_error(out: &mut dyn Write, err: &dyn Error, debug: bool) -> io::Result<()> {
    writeln!(out, "Error: {err}")?;
    if !debug {
        return Ok(());
    }

    let mut last = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if message != last {
            writeln!(out, "Caused by: {message}")?;
        }
        last = message;
        source = cause.source();
    }
    writeln!(out, "{err:?}")
}
