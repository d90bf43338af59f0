//! Versioning engine configuration

use std::{path::PathBuf, time::Duration};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default environment prefix, e.g. `LABELWORKS_VERSIONING__MAX_VERSIONS_PER_DESIGN=20`
pub const DEFAULT_ENV_PREFIX: &str = "LABELWORKS_VERSIONING";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables of the versioning engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Versions kept per design before the oldest are pruned
    pub max_versions_per_design: usize,
    /// Extra numbering attempts after a unique-constraint violation
    pub numbering_retries: u32,
    pub transaction_timeout_ms: u64,
    pub retention_enabled: bool,
    pub audit_enabled: bool,
    /// Directory for the file-backed store; in-memory when unset
    pub storage_dir: Option<PathBuf>,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            max_versions_per_design: 50,
            numbering_retries: 1,
            transaction_timeout_ms: 5_000,
            retention_enabled: true,
            audit_enabled: true,
            storage_dir: None,
        }
    }
}

impl VersioningConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_versions_per_design == 0 {
            return Err(ConfigError::Validation(
                "max_versions_per_design must be greater than 0".to_string(),
            ));
        }
        if self.transaction_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "transaction_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

/// Loads [`VersioningConfig`] from an optional TOML file overlaid with
/// environment variables
pub struct VersioningConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl VersioningConfigLoader {
    /// Environment-only loader
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Loader reading `path` first; a missing file is not an error
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> ConfigResult<VersioningConfig> {
        let mut builder = Config::builder();
        if let Some(path) = &self.config_path {
            builder = builder.add_source(File::from(path.clone()).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: VersioningConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Write `config` as TOML to the loader's path
    pub fn save(&self, config: &VersioningConfig) -> ConfigResult<()> {
        let Some(path) = &self.config_path else {
            return Err(ConfigError::Validation(
                "No configuration path to save to".to_string(),
            ));
        };
        config.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string(config)?)?;
        Ok(())
    }
}

impl Default for VersioningConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
