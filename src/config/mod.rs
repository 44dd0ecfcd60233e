//! Configuration Module
//!
//! Handles application configuration loading, validation, and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Onboarding persistence
    #[serde(default)]
    pub onboarding: OnboardingConfig,

    /// Capability probe behaviour
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which persistence backend holds onboarding progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "toml" => Ok(Self::File),
            "sqlite" | "db" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown store backend: {}", other),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Persistence backend (default: file)
    #[serde(default)]
    pub store: StoreBackend,

    /// Override for the state file / database location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl OnboardingConfig {
    /// Effective location of the onboarding record for the configured backend
    pub fn state_path(&self) -> PathBuf {
        if let Some(ref path) = self.state_path {
            return path.clone();
        }
        match self.store {
            StoreBackend::Sqlite => capture_home().join("onboarding.db"),
            StoreBackend::File | StoreBackend::Memory => capture_home().join("onboarding.toml"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Answer the capability probe gives when no platform check is wired in
    #[serde(default = "default_assume_granted")]
    pub assume_granted: bool,
}

fn default_assume_granted() -> bool {
    true
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            assume_granted: default_assume_granted(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also log to this file (no rotation)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Directory for debug-mode log files (default: ./.capture/logs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// Effective debug log directory
    pub fn log_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(crate::logging::default_log_dir)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Application home: `~/.capture`
pub fn capture_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".capture")
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/capture/config.toml
    /// 3. Local config: ./capture.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::load_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::load_file(&local_config_path)?;
        }

        config = Self::apply_env_overrides(config)?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::load_file(path)?;
        Self::apply_env_overrides(config)
    }

    /// Get the system config path: ~/.config/capture/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("capture").join("config.toml"))
    }

    /// Get the local config path: ./capture.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./capture.toml")
    }

    /// A later file replaces earlier ones wholesale; missing sections keep their defaults
    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Self) -> Result<Self> {
        if let Ok(store) = std::env::var("CAPTURE_STORE") {
            config.onboarding.store = store.parse()?;
        }

        if let Ok(path) = std::env::var("CAPTURE_STATE_PATH") {
            config.onboarding.state_path = Some(PathBuf::from(path));
        }

        if let Ok(log_level) = std::env::var("CAPTURE_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        if let Ok(log_file) = std::env::var("CAPTURE_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(log_file));
        }

        if let Ok(log_dir) = std::env::var("CAPTURE_LOGS_LOCATION") {
            config.logging.dir = Some(PathBuf::from(log_dir));
        }

        if let Ok(granted) = std::env::var("CAPTURE_ASSUME_GRANTED") {
            config.probe.assume_granted = granted.parse().unwrap_or(true);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if let Some(ref path) = self.onboarding.state_path
            && path.as_os_str().is_empty()
        {
            anyhow::bail!("onboarding.state_path is set but empty");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.onboarding.store, StoreBackend::File);
        assert!(config.onboarding.state_path.is_none());
        assert!(config.probe.assume_granted);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_state_path() {
        let mut config = Config::default();
        config.onboarding.state_path = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
[onboarding]
store = "sqlite"
state_path = "/custom/path/onboarding.db"

[probe]
assume_granted = false

[logging]
level = "debug"
dir = "/var/log/capture"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.onboarding.store, StoreBackend::Sqlite);
        assert_eq!(
            config.onboarding.state_path(),
            PathBuf::from("/custom/path/onboarding.db")
        );
        assert!(!config.probe.assume_granted);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.log_dir(), PathBuf::from("/var/log/capture"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"error\"\n").unwrap();
        assert_eq!(config.logging.level, "error");
        assert_eq!(config.onboarding.store, StoreBackend::File);
        assert!(config.probe.assume_granted);
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.onboarding.store = StoreBackend::Memory;

        config.save(temp_file.path()).unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        let loaded: Config = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.onboarding.store, StoreBackend::Memory);
        assert_eq!(loaded.logging.level, config.logging.level);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        assert!(Config::load_from_path("/definitely/not/here/capture.toml").is_err());
    }

    #[test]
    fn test_default_state_path_follows_backend() {
        let mut onboarding = OnboardingConfig::default();
        assert!(onboarding.state_path().ends_with("onboarding.toml"));
        onboarding.store = StoreBackend::Sqlite;
        assert!(onboarding.state_path().ends_with("onboarding.db"));
    }

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!("toml".parse::<StoreBackend>().unwrap(), StoreBackend::File);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_system_config_path() {
        if let Some(path) = Config::system_config_path() {
            assert!(path.to_string_lossy().contains("capture"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
