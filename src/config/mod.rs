//! Configuration loading and validation.
//!
//! Settings come from an optional TOML file, overridden by `PATHSTORE_*`
//! environment variables (nested keys use `__`, e.g.
//! `PATHSTORE_STORAGE__TEMP_PREFIX`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageOptions;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "PATHSTORE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Failed to render config: {0}")]
    RenderError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory backing the storage root
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    #[serde(default)]
    pub storage: StorageOptions,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            log_level: default_log_level(),
            json_logs: false,
            storage: StorageOptions::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (if it exists) and the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = ::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml)
            .required(false);
        let env = ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        Self::build(::config::Config::builder().add_source(file).add_source(env))
    }

    /// Load configuration from a TOML file only, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = ::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml);
        Self::build(::config::Config::builder().add_source(file))
    }

    fn build(
        builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.temp_name_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "Temp name attempts must be greater than 0".to_string(),
            ));
        }

        if self.storage.temp_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "Temp prefix must not be empty".to_string(),
            ));
        }

        if self.storage.temp_prefix.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "Temp prefix must not contain path separators: {:?}",
                self.storage.temp_prefix
            )));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
