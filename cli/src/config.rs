//! Front-end configuration.
//!
//! Loaded from `--config PATH`, or `.invoke.yml` in the working directory
//! when present.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! variables:
//!   user: alice
//! commands:
//!   commands:
//!     render_options:
//!       fields:
//!         default: [name, description]
//!   echo:
//!     alias: say
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use invocation_core::DescriptorOverlay;
use invocation_translate::{Registry, RegistryError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".invoke.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config customizes unknown command {0}")]
    UnknownCommand(String),

    #[error("config for command {command}: {source}")]
    Command {
        command: String,
        #[source]
        source: RegistryError,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeConfig {
    /// Configuration format version (e.g. `"1.0"`).
    #[serde(default = "default_version")]
    pub version: String,
    /// Values for `$name` default expressions.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// Per-command descriptor overrides.
    #[serde(default)]
    pub commands: BTreeMap<String, DescriptorOverlay>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            variables: BTreeMap::new(),
            commands: BTreeMap::new(),
        }
    }
}

impl InvokeConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::to_writer(BufWriter::new(file), self).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` when given, else [`DEFAULT_CONFIG_FILE`] from `dir`
    /// if it exists, else the empty configuration.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = dir.join(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            debug!(path = %fallback.display(), "using config from working directory");
            return Self::load(fallback);
        }
        Ok(Self::default())
    }

    /// Applies command overrides to a populated registry.
    pub fn apply<T>(&self, registry: &mut Registry<T>) -> Result<(), ConfigError> {
        for (name, overlay) in &self.commands {
            if registry.get(name).is_none() {
                return Err(ConfigError::UnknownCommand(name.clone()));
            }
            registry
                .apply_overlay(name, overlay)
                .map_err(|source| ConfigError::Command {
                    command: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
