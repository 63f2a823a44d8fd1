//! Configuration for the step agent.

use crate::core::detector::{DetectorConfig, DetectorConfigError};
use crate::core::progress::DEFAULT_STEP_GOAL;
use crate::store::worker::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config/data dirs.
pub const APP_DIR: &str = "fitness-step-agent";

/// Main configuration for the step agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Step detection parameters
    pub detector: DetectorConfig,

    /// Goal used when the profile has none
    pub default_step_goal: u32,

    /// Identity whose profile holds the goals
    pub user_id: Option<String>,

    /// Path for the step count, profiles and activity stats
    pub data_path: PathBuf,

    /// Capacity of the background persistence queue
    pub persist_queue_capacity: usize,

    /// Default log level when `FITSTEP_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            detector: DetectorConfig::default(),
            default_step_goal: DEFAULT_STEP_GOAL,
            user_id: None,
            data_path: data_dir,
            persist_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, or defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Path of the persisted activity statistics.
    pub fn activity_path(&self) -> PathBuf {
        self.data_path.join("activity.json")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        if self.default_step_goal == 0 {
            return Err(ConfigError::Invalid(
                "default_step_goal must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid detector settings: {0}")]
    Detector(#[from] DetectorConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
