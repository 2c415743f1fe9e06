//! Configuration
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. Host config (`~/.config/storagectl/config.toml` or `--config`)
//! 3. CLI flags
//!
//! The merged value is deserialized into [`CtlConfig`].

mod defaults;
mod merge;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

pub use defaults::{builtin_layer, DEFAULT_CONNECT_TIMEOUT_SECONDS, DEFAULT_LOG_FILTER};
pub use merge::{deep_merge, merge_layers};

/// Upper bound for the SSH connect timeout
pub const MAX_CONNECT_TIMEOUT_SECONDS: u32 = 600;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// SSH connection settings applied to every node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSettings {
    pub connect_timeout_seconds: u32,
    pub server_alive_interval: u32,
    pub server_alive_count_max: u32,
}

/// Effective storagectl configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CtlConfig {
    /// Inventory file (None = default location)
    #[serde(rename = "inventory")]
    pub inventory_path: Option<PathBuf>,

    /// Tags every fleet member must carry
    #[serde(rename = "tags")]
    pub required_tags: Vec<String>,

    /// Order the fleet by priority instead of file order
    pub by_priority: bool,

    /// Map lookup failures to non-zero exit codes
    pub strict_exit: bool,

    /// tracing filter directive
    pub log: String,

    pub ssh: SshSettings,
}

impl CtlConfig {
    /// Default host config location
    pub fn default_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config/storagectl/config.toml"))
    }

    /// Merge all layers.
    ///
    /// An explicitly given host config must exist; the default one is optional.
    pub fn build(explicit_path: Option<&Path>, cli_overrides: Value) -> Result<Self, ConfigError> {
        let mut layers = vec![builtin_layer()];

        match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                layers.push(load_toml_file(path)?);
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.exists()) {
                    layers.push(load_toml_file(&path)?);
                }
            }
        }

        layers.push(cli_overrides);
        Self::from_value(merge_layers(layers))
    }

    /// Deserialize and validate a merged config value
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: CtlConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.ssh.connect_timeout_seconds;
        if timeout == 0 || timeout > MAX_CONNECT_TIMEOUT_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "ssh.connect_timeout_seconds must be in 1..={}, got {}",
                MAX_CONNECT_TIMEOUT_SECONDS, timeout
            )));
        }

        if self.required_tags.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("tags must not be empty strings".to_string()));
        }

        Ok(())
    }
}

impl Default for CtlConfig {
    fn default() -> Self {
        Self {
            inventory_path: None,
            required_tags: Vec::new(),
            by_priority: false,
            strict_exit: false,
            log: DEFAULT_LOG_FILTER.to_string(),
            ssh: SshSettings {
                connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECONDS,
                server_alive_interval: 15,
                server_alive_count_max: 2,
            },
        }
    }
}

fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&contents)?;
    Ok(toml_to_json(table))
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect(),
        ),
    }
}
