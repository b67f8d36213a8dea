//! Optional TOML configuration (`~/.tracemeter/config.toml`)

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{Result, TracemeterError, DEFAULT_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySettings {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            project_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Non-fatal load outcome, reported once logging is initialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Home directory could not be resolved, defaults were used
    NoHomeDir,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHomeDir => f.write_str("home directory unknown, using default config"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub output: OutputSettings,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            query: QuerySettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl AppConfig {
    /// Default config path, `None` when the home directory is unknown
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.home_dir().join(".tracemeter").join("config.toml"))
    }

    /// Load from an explicit path, or from the default path if it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<ConfigWarning>)> {
        Self::load_with_default(explicit, Self::default_path())
    }

    fn load_with_default(
        explicit: Option<&Path>,
        default_path: Option<PathBuf>,
    ) -> Result<(Self, Option<ConfigWarning>)> {
        match (explicit, default_path) {
            (Some(path), _) => Ok((Self::from_file(path)?, None)),
            (None, Some(path)) if path.exists() => Ok((Self::from_file(&path)?, None)),
            (None, Some(_)) => Ok((Self::default(), None)),
            (None, None) => Ok((Self::default(), Some(ConfigWarning::NoHomeDir))),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TracemeterError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| TracemeterError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
