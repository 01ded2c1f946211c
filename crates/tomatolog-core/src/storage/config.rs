//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Work and break lengths, autostart
//! - Log destination, level and focused-file preference
//! - Reward/energy sampling toggles
//!
//! Configuration is stored at `~/.config/tomatolog/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::logger::{LogLevel, LogSettings};

/// Timer lengths, in minutes. Fractional values are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: f64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: f64,
    #[serde(default)]
    pub autostart: bool,
}

/// Section-log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub level: LogLevel,
    /// Log document, relative to the vault root. Absent means "nowhere"
    /// (unless a focused task provides a destination).
    #[serde(default)]
    pub path: Option<String>,
    /// Log into the tracked task's own document when possible.
    #[serde(default)]
    pub prefer_focused: bool,
}

/// Which metrics to sample during work sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub reward: bool,
    #[serde(default)]
    pub energy: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tomatolog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

fn default_work_minutes() -> f64 {
    25.0
}
fn default_break_minutes() -> f64 {
    5.0
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            autostart: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::All,
            path: None,
            prefer_focused: false,
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    /// The logger settings this configuration describes.
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            enabled: self.log.enabled,
            level: self.log.level,
            path: self.log.path.clone(),
            prefer_focused: self.log.prefer_focused,
        }
    }
}
