//! jukebox-sched specific configuration

use crate::error::{Error, Result};
use jukebox_common::config::{load_toml_or_default, resolve_config_path};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "JUKEBOX_CONFIG";

/// Scheduler configuration
///
/// Every field has a compiled default, so a partial (or absent) TOML file
/// is valid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// PlaybackMonitor tick
    pub poll_interval_ms: u64,
    /// Upper bound for any single resolver or engine call
    pub collaborator_timeout_ms: u64,
    /// How long the engine may keep reporting "ended" after a promotion
    /// before the monitor treats the item as failed and advances past it
    pub start_grace_ms: u64,
    /// Player instance name stored with each history record
    pub player_name: String,
    /// SQLite URL for catalog and play history, e.g. `sqlite://jukebox.db`
    pub database_url: Option<String>,
    /// Event bus buffer size
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            collaborator_timeout_ms: 5000,
            start_grace_ms: 5000,
            player_name: "jukebox".to_string(),
            database_url: None,
            event_capacity: 100,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration
    ///
    /// File priority: `cli_path`, then `$JUKEBOX_CONFIG`, then the platform
    /// config directory. No file at all means compiled defaults.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR);
        let config: Self = load_toml_or_default(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".to_string()));
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(Error::Config(
                "collaborator_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be greater than 0".to_string()));
        }
        if self.player_name.trim().is_empty() {
            return Err(Error::Config("player_name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.collaborator_timeout(), Duration::from_secs(5));
        assert_eq!(config.start_grace_ms, 5000);
    }

    #[test]
    fn test_zero_start_grace_allowed() {
        // Zero means recover on the first ended tick after a promotion
        let config = SchedulerConfig::from_toml_str("start_grace_ms = 0").unwrap();
        assert_eq!(config.start_grace_ms, 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SchedulerConfig::from_toml_str("player_name = \"lounge\"").unwrap();
        assert_eq!(config.player_name, "lounge");
        assert_eq!(config.poll_interval_ms, 500);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = SchedulerConfig::from_toml_str("poll_interval_ms = 0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = SchedulerConfig::from_toml_str("collaborator_timeout_ms = 0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result = SchedulerConfig::from_toml_str("poll_interval_ms = \"fast\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_load_from_env_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 250").unwrap();
        writeln!(file, "database_url = \"sqlite::memory:\"").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        let config = SchedulerConfig::load(None).unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    #[serial]
    fn test_load_missing_cli_path_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SchedulerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "event_capacity = 0").unwrap();

        let result = SchedulerConfig::load(Some(file.path()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
