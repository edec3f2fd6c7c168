//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/sprintlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/sprintlens/` (~/.config/sprintlens/)
//! - Data: `$XDG_DATA_HOME/sprintlens/` (~/.local/share/sprintlens/)
//! - State/Logs: `$XDG_STATE_HOME/sprintlens/` (~/.local/state/sprintlens/)

use crate::error::{Error, Result};
use crate::types::StatusVocabulary;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Status-name vocabulary for phase classification
    #[serde(default)]
    pub statuses: StatusConfig,

    /// Custom-field ids used by the snapshot decoder
    #[serde(default)]
    pub fields: FieldMap,

    /// Snapshot discovery configuration
    #[serde(default)]
    pub snapshots: SnapshotConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Status names classified as in-progress / done.
///
/// The engine itself has no defaults; these are the caller-level
/// conventions most Jira workflows ship with, overridable per project.
#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    #[serde(default = "default_in_progress_names")]
    pub in_progress: Vec<String>,

    #[serde(default = "default_done_names")]
    pub done: Vec<String>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            in_progress: default_in_progress_names(),
            done: default_done_names(),
        }
    }
}

impl StatusConfig {
    /// Build the engine-facing vocabulary.
    pub fn vocabulary(&self) -> StatusVocabulary {
        StatusVocabulary::new(self.in_progress.clone(), self.done.clone())
    }
}

fn default_in_progress_names() -> Vec<String> {
    vec!["In Progress".to_string()]
}

fn default_done_names() -> Vec<String> {
    vec![
        "Done".to_string(),
        "Closed".to_string(),
        "Resolved".to_string(),
    ]
}

/// Custom-field ids for the snapshot decoder.
///
/// Jira exposes story points and sprint membership through
/// instance-specific custom fields; these defaults match the common
/// cloud defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct FieldMap {
    #[serde(default = "default_story_points_field")]
    pub story_points: String,

    #[serde(default = "default_sprint_field")]
    pub sprint: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            story_points: default_story_points_field(),
            sprint: default_sprint_field(),
        }
    }
}

fn default_story_points_field() -> String {
    "customfield_10016".to_string()
}

fn default_sprint_field() -> String {
    "customfield_10007".to_string()
}

/// Snapshot discovery configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    /// Directory scanned for exported `*.json` snapshots.
    /// Defaults to `$XDG_DATA_HOME/sprintlens/snapshots`.
    pub dir: Option<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { dir: None }
    }
}

impl SnapshotConfig {
    /// Resolved snapshot directory.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("snapshots"))
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/sprintlens/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("sprintlens").join("config.toml")
    }

    /// Returns the data directory path (snapshot storage)
    ///
    /// `$XDG_DATA_HOME/sprintlens/`
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("sprintlens")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/sprintlens/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("sprintlens")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/sprintlens/sprintlens.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("sprintlens.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path
    /// behavior before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.statuses.in_progress, vec!["In Progress"]);
        assert_eq!(config.statuses.done.len(), 3);
        assert_eq!(config.fields.story_points, "customfield_10016");
        assert_eq!(config.fields.sprint, "customfield_10007");
        assert!(config.snapshots.dir.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[statuses]
in_progress = ["In Progress", "Doing"]
done = ["Done"]

[fields]
story_points = "customfield_20001"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.statuses.in_progress.len(), 2);
        assert_eq!(config.statuses.done, vec!["Done"]);
        assert_eq!(config.fields.story_points, "customfield_20001");
        // Unset fields keep their defaults.
        assert_eq!(config.fields.sprint, "customfield_10007");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_vocabulary_from_statuses() {
        let config = Config::default();
        let vocab = config.statuses.vocabulary();
        assert!(vocab.in_progress.contains("In Progress"));
        assert!(vocab.done.contains("Resolved"));
    }

    #[test]
    fn test_snapshot_dir_override() {
        let toml = r#"
[snapshots]
dir = "/tmp/exports"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.snapshots.resolved_dir(),
            PathBuf::from("/tmp/exports")
        );
    }
}
