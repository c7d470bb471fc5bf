//! Configuration management module.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calendar::WeekStart;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HR backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header.
    #[serde(default)]
    pub token: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Dashboard refresh and layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Wall-clock ticker interval.
    pub clock_tick_secs: u64,
    /// Today's-hours recompute interval while clocked in.
    pub hours_refresh_secs: u64,
    /// Number of trailing weeks in the task-completion trend.
    pub trend_weeks: u32,
    pub week_start: WeekStart,
}

/// Export settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Target directory for exports. Falls back to the current directory.
    pub directory: Option<PathBuf>,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl AppConfig {
    /// Get config file path (platform config directory).
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "HrDashboard", "hr-dashboard")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("API base URL cannot be empty".to_string()));
        }
        if !self.api.base_url.starts_with("http") {
            return Err(ConfigError::Validation(
                "API base URL must start with http:// or https://".to_string(),
            ));
        }
        if self.api.timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "API timeout must be at least 1 second".to_string(),
            ));
        }
        if self.dashboard.clock_tick_secs < 1 {
            return Err(ConfigError::Validation(
                "Clock tick must be at least 1 second".to_string(),
            ));
        }
        if self.dashboard.hours_refresh_secs < self.dashboard.clock_tick_secs {
            return Err(ConfigError::Validation(
                "Hours refresh interval cannot be shorter than the clock tick".to_string(),
            ));
        }
        if self.dashboard.trend_weeks < 1 {
            return Err(ConfigError::Validation("Trend weeks must be at least 1".to_string()));
        }
        if self.dashboard.trend_weeks > 52 {
            return Err(ConfigError::Validation("Trend weeks cannot exceed 52".to_string()));
        }
        if self.logging.file_prefix.trim().is_empty() {
            return Err(ConfigError::Validation("Log file prefix cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory exports are written to.
    pub fn export_dir(&self) -> PathBuf {
        self.export.directory.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl ApiConfig {
    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            clock_tick_secs: 1,
            hours_refresh_secs: 60,
            trend_weeks: 4,
            week_start: WeekStart::Sunday,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "hr-dashboard.log".to_string(),
        }
    }
}
