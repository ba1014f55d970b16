//! Configuration management for the MysticChests backend
//!
//! Settings are loaded from a TOML file, fall back to sensible defaults
//! when no file is present, and can be overridden from the command line
//! by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{BackendResult, ConfigError};

/// Main configuration structure for the backend daemon
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Guide tracker settings
    #[serde(default)]
    pub guide: GuideConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the chest database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("mystic_chests.db"),
        }
    }
}

/// Guide tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Period between directional hints, in milliseconds
    pub hint_period_ms: u64,

    /// Maximum hint trail length, in blocks
    pub hint_range: f64,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            hint_period_ms: 100,
            hint_range: 2.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> BackendResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        debug!("loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BackendResult<()> {
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage.database_path".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.guide.hint_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "guide.hint_period_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        if self.guide.hint_range <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "guide.hint_range".to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::Invalid {
                field: "logging.level".to_string(),
                reason: format!("unknown level {other:?}"),
            }
            .into()),
        }
    }

    /// The tracker period as a [`Duration`].
    pub fn hint_period(&self) -> Duration {
        Duration::from_millis(self.guide.hint_period_ms)
    }
}
