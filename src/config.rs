//! Marshalling configuration
//!
//! Loaded from a TOML file with optional sections:
//!
//! ```toml
//! [marshal]
//! coercion = "strict"   # or "convert"
//!
//! [logging]
//! level = "debug"
//! json = false
//! file = "gencall.log"
//! ```
//!
//! `GENCALL_COERCION` overrides the coercion policy from the environment.

use crate::error::ConfigError;
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

/// What happens when a slot is read or written as a different primitive kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Kind must match the declared kind exactly, otherwise `TypeMismatch`
    #[default]
    Strict,
    /// Numeric conversion with truncation or extension
    Convert,
}

impl FromStr for CoercionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "convert" => Ok(Self::Convert),
            _ => Err(ConfigError::InvalidValue {
                key: "coercion",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarshalConfig {
    #[serde(default)]
    pub marshal: MarshalSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarshalSection {
    #[serde(default)]
    pub coercion: CoercionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub file: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: None,
        }
    }
}

impl MarshalConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var("GENCALL_COERCION") {
            self.marshal.coercion = value.parse()?;
        }
        Ok(self)
    }

    #[inline]
    pub fn coercion(&self) -> CoercionPolicy {
        self.marshal.coercion
    }

    /// Logging settings derived from the `[logging]` section
    pub fn log_config(&self) -> LogConfig {
        let level = Level::from_str(&self.logging.level).unwrap_or(Level::INFO);
        LogConfig {
            level,
            file_output: self.logging.file.is_some(),
            log_path: self.logging.file.clone(),
            json_format: self.logging.json,
            ..LogConfig::default()
        }
    }
}

impl FromStr for MarshalConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
