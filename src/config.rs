//! Logger configuration and on-disk layout

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::rotation::LATEST_LOG_NAME;

/// Startup parameters for a `Logger`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Display name, shown in every tag and in the shutdown notice
    #[serde(default = "default_name")]
    pub name: String,

    /// Print DEBUG messages to the console (they always go to the log file)
    #[serde(default)]
    pub debug: bool,

    /// Root of the log tree
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Force styled console output even when the terminal was not detected as supporting it
    #[serde(default)]
    pub force_styled: bool,

    /// Grace period between an ERROR being logged and the fatal signal (default: 10)
    #[serde(default = "default_shutdown_delay_secs")]
    pub shutdown_delay_secs: u64,
}

fn default_name() -> String {
    "Logger".to_string()
}

fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("logs")
}

fn default_shutdown_delay_secs() -> u64 {
    10
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            debug: false,
            log_dir: default_log_dir(),
            force_styled: false,
            shutdown_delay_secs: default_shutdown_delay_secs(),
        }
    }
}

impl LoggerConfig {
    /// Config with the given name and log directory, everything else default
    pub fn new(name: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            log_dir: log_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file, or return defaults if it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| LogError::io("failed to read logger config", path, e))?;
        toml::from_str(&content).map_err(|e| LogError::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let content = toml::to_string_pretty(self).context("Failed to serialize logger config")?;
        std::fs::write(path, content).context("Failed to write logger config")?;
        Ok(())
    }

    pub fn shutdown_delay(&self) -> Duration {
        Duration::from_secs(self.shutdown_delay_secs)
    }

    pub fn dirs(&self) -> LogDirs {
        LogDirs::new(&self.log_dir)
    }
}

/// Directory layout under the log root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirs {
    pub root: PathBuf,
    /// Session logs: the current one and the dated archive tree
    pub full: PathBuf,
    /// Cumulative per-origin warning logs
    pub warn: PathBuf,
    /// Cumulative per-origin error logs
    pub error: PathBuf,
}

impl LogDirs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            full: root.join("full"),
            warn: root.join("warn"),
            error: root.join("error"),
        }
    }

    /// Path of the current session log
    pub fn latest(&self) -> PathBuf {
        self.full.join(LATEST_LOG_NAME)
    }

    /// Create the root and its `full`, `warn` and `error` subdirectories
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.full, &self.warn, &self.error] {
            std::fs::create_dir_all(dir)
                .map_err(|e| LogError::io("failed to create log directory", dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.name, "Logger");
        assert!(!config.debug);
        assert!(!config.force_styled);
        assert!(config.log_dir.ends_with("logs"));
        assert_eq!(config.shutdown_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggerConfig::load(&temp_dir.path().join("relaylog.toml")).unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relaylog.toml");
        std::fs::write(&path, "name = \"Relay\"\ndebug = true\n").unwrap();

        let config = LoggerConfig::load(&path).unwrap();
        assert_eq!(config.name, "Relay");
        assert!(config.debug);
        assert_eq!(config.shutdown_delay_secs, 10);
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relaylog.toml");
        std::fs::write(&path, "debug = \"sometimes\"").unwrap();

        assert!(matches!(
            LoggerConfig::load(&path),
            Err(LogError::Config { .. })
        ));
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relaylog.toml");
        let mut config = LoggerConfig::new("Relay", temp_dir.path().join("logs"));
        config.force_styled = true;
        config.save(&path).unwrap();

        assert_eq!(LoggerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_dirs_layout_and_ensure() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = LogDirs::new(&temp_dir.path().join("logs"));
        dirs.ensure().unwrap();

        assert!(dirs.full.is_dir());
        assert!(dirs.warn.is_dir());
        assert!(dirs.error.is_dir());
        assert!(dirs.latest().ends_with("full/00A-latest.log"));
    }
}
