//! Main application configuration
//!
//! This module defines the primary configuration structures for the ladder,
//! including environment variable loading, TOML file loading and validation.

use crate::config::rating::RatingConfig;
use crate::error::{LadderError, Result};
use crate::rating::EloConfig;
use crate::storage::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub recording: RecordingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Ladder data file used by the JSON store
    pub data_file: PathBuf,
    /// Password granting admin access; no password means every caller is admin
    pub admin_password: Option<String>,
}

/// Match recording settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    /// Commit attempts before a concurrency conflict is surfaced
    pub max_commit_attempts: u32,
    /// Default number of history rows shown per player
    pub history_limit: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "padel-ladder".to_string(),
            log_level: "info".to_string(),
            data_file: PathBuf::from("ladder.json"),
            admin_password: None,
        }
    }
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            max_commit_attempts: 3,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn config_error(message: impl Into<String>) -> anyhow::Error {
    LadderError::Configuration {
        message: message.into(),
    }
    .into()
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| config_error(format!("Invalid {} value: {}", key, value)))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(data_file) = env::var("LADDER_DATA_FILE") {
            self.service.data_file = PathBuf::from(data_file);
        }
        if let Ok(password) = env::var("LADDER_ADMIN_PASSWORD") {
            self.service.admin_password = Some(password);
        }

        // Rating settings
        if let Ok(k) = env::var("ELO_K_FACTOR") {
            self.rating.k_factor = parse_var("ELO_K_FACTOR", &k)?;
        }
        if let Ok(initial) = env::var("ELO_INITIAL_RATING") {
            self.rating.initial_rating = parse_var("ELO_INITIAL_RATING", &initial)?;
        }

        // Recording settings
        if let Ok(attempts) = env::var("MAX_COMMIT_ATTEMPTS") {
            self.recording.max_commit_attempts = parse_var("MAX_COMMIT_ATTEMPTS", &attempts)?;
        }
        if let Ok(limit) = env::var("HISTORY_LIMIT") {
            self.recording.history_limit = parse_var("HISTORY_LIMIT", &limit)?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(config_error(format!(
                "Invalid log level: {}",
                config.service.log_level
            )))
        }
    }

    if config.service.data_file.as_os_str().is_empty() {
        return Err(config_error("Data file cannot be empty"));
    }

    EloConfig::from(&config.rating).validate()?;

    if config.recording.max_commit_attempts == 0 {
        return Err(config_error("Max commit attempts must be at least 1"));
    }
    if config.recording.history_limit == 0 {
        return Err(config_error("History limit must be at least 1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.rating.initial_rating, 1500);
        assert_eq!(config.recording.max_commit_attempts, 3);
        assert_eq!(config.recording.history_limit, 10);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [rating]
            k_factor = 24.0

            [service]
            data_file = "league.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.rating.k_factor, 24.0);
        assert_eq!(config.rating.initial_rating, 1500);
        assert_eq!(config.service.data_file, PathBuf::from("league.json"));
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = AppConfig::from_toml("[rating\nk_factor = ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.rating.k_factor = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.rating.k_factor = 1e20;
        assert!(matches!(
            validate_config(&config).unwrap_err().downcast_ref::<LadderError>(),
            Some(LadderError::Configuration { .. })
        ));

        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.recording.max_commit_attempts = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.recording.history_limit = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ladder.toml");
        fs::write(&path, "[recording]\nmax_commit_attempts = 5\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.recording.max_commit_attempts, 5);

        assert!(AppConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
