//! Configuration management for IronNotes
//!
//! Settings are an explicit value handed to whatever needs them; nothing in
//! the library reads configuration behind the caller's back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::timer::{DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE, MAX_ADJUSTED_SECS, MIN_ADJUSTED_SECS};
use crate::types::WeightUnit;

pub const CONFIG_ENV: &str = "IRONNOTES_CONFIG";
pub const DB_PATH_ENV: &str = "IRONNOTES_DB_PATH";

const DEFAULT_DB_PATH: &str = "~/.local/share/ironnotes/workouts.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub unit: WeightUnit,
    /// Default rest between sets, in seconds
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Display refresh interval; cosmetic only
    #[serde(default = "default_refresh_millis")]
    pub refresh_millis: u64,
    #[serde(default = "default_notification_title")]
    pub notification_title: String,
    #[serde(default = "default_notification_body")]
    pub notification_body: String,
    /// External notifier run when a backgrounded timer completes,
    /// e.g. "notify-send". Title and body are appended as arguments.
    #[serde(default)]
    pub notify_command: Option<String>,
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_refresh_millis() -> u64 {
    100
}

fn default_notification_title() -> String {
    DEFAULT_NOTIFICATION_TITLE.to_string()
}

fn default_notification_body() -> String {
    DEFAULT_NOTIFICATION_BODY.to_string()
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            unit: WeightUnit::default(),
            rest_seconds: default_rest_seconds(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            refresh_millis: default_refresh_millis(),
            notification_title: default_notification_title(),
            notification_body: default_notification_body(),
            notify_command: None,
        }
    }
}

impl TrainingConfig {
    /// Default rest duration, clamped to the timer's adjustable range
    pub fn rest_duration_secs(&self) -> u32 {
        (self.rest_seconds as i64).clamp(MIN_ADJUSTED_SECS, MAX_ADJUSTED_SECS) as u32
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error; defaults are used instead.
    /// `IRONNOTES_DB_PATH` overrides the database path either way.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            Self::default_config()
        };

        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            config.database.path = db_path;
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()).into());
        }
        if self.timer.refresh_millis == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timer.refresh_millis".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: DEFAULT_DB_PATH.to_string(),
            },
            training: TrainingConfig::default(),
            timer: TimerConfig::default(),
        }
    }

    /// Database path with `~` expanded
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database.path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("ironnotes").join("config.toml"))
}
