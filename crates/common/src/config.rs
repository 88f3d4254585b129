//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RepcountResult;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default counting settings.
    #[serde(default)]
    pub counter: CounterDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default counting parameters used when the CLI does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterDefaults {
    /// Exercise to count when none is given (e.g., "squat", "push-up").
    pub exercise: String,

    /// Optional target rep count. `None` means no goal.
    pub goal: Option<u32>,

    /// Frame rate assumed for replay streams without a header.
    pub replay_fps: u32,

    /// Whether replays are paced at their frame rate instead of as fast as possible.
    pub realtime: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "repcount=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for CounterDefaults {
    fn default() -> Self {
        Self {
            exercise: "squat".to_string(),
            goal: None,
            replay_fps: 30,
            realtime: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        match Self::read_from(config_path) {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Read config from an explicit path. `Ok(None)` when no file exists.
    pub fn read_from(config_path: &Path) -> RepcountResult<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(config_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config as pretty JSON, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("repcount").join("config.json")
}
