// SPDX-License-Identifier: MPL-2.0
//! This module handles the crate's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use diagnostics_journal::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.max_log_size_bytes = Some(512 * 1024);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

mod defaults;

pub use defaults::*;

use crate::domain::diagnostics::{InsightTimeout, MaxLogSize, TrimBatch};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "DiagnosticsJournal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the log file. Defaults to the platform data directory.
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
    #[serde(default)]
    pub max_log_size_bytes: Option<u64>,
    #[serde(default)]
    pub trim_batch: Option<usize>,
    #[serde(default)]
    pub insight_timeout_ms: Option<u64>,
    #[serde(default)]
    pub report_filename: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_directory: None,
            max_log_size_bytes: Some(DEFAULT_MAX_LOG_SIZE_BYTES),
            trim_batch: Some(DEFAULT_TRIM_BATCH),
            insight_timeout_ms: Some(DEFAULT_INSIGHT_TIMEOUT_MS),
            report_filename: None,
        }
    }
}

impl Config {
    /// Directory where the log file lives.
    ///
    /// Falls back to `<data dir>/DiagnosticsJournal`, then to the current directory.
    #[must_use]
    pub fn log_directory(&self) -> PathBuf {
        self.log_directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|mut path| {
                    path.push(APP_NAME);
                    path
                })
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        })
    }

    /// Full path of the log file.
    #[must_use]
    pub fn log_file_path(&self) -> PathBuf {
        self.log_directory().join(LOG_FILE_NAME)
    }

    #[must_use]
    pub fn max_log_size(&self) -> MaxLogSize {
        self.max_log_size_bytes
            .map(MaxLogSize::new)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn trim_batch(&self) -> TrimBatch {
        self.trim_batch.map(TrimBatch::new).unwrap_or_default()
    }

    #[must_use]
    pub fn insight_timeout(&self) -> InsightTimeout {
        self.insight_timeout_ms
            .map(InsightTimeout::new)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn report_filename(&self) -> String {
        self.report_filename
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_FILENAME.to_string())
    }
}

/// Returns true when the process runs inside a test harness.
///
/// Reads [`TEST_HARNESS_ENV`]; any non-empty value other than `0` counts.
#[must_use]
pub fn is_test_harness() -> bool {
    std::env::var(TEST_HARNESS_ENV)
        .map(|value| !value.is_empty() && value != "0")
        .unwrap_or(false)
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(?path, %err, "Invalid settings file, using defaults");
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_fields() {
        let config = Config {
            log_directory: Some(PathBuf::from("/var/lib/journal")),
            max_log_size_bytes: Some(4096),
            trim_batch: Some(5),
            insight_timeout_ms: Some(250),
            report_filename: Some("support.html".to_string()),
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn missing_fields_fall_back_to_none() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "trim_batch = 3\n").expect("failed to write toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.trim_batch, Some(3));
        assert!(loaded.max_log_size_bytes.is_none());
        assert_eq!(loaded.max_log_size().value(), DEFAULT_MAX_LOG_SIZE_BYTES);
    }

    #[test]
    fn accessors_clamp_out_of_range_values() {
        let config = Config {
            max_log_size_bytes: Some(1),
            trim_batch: Some(0),
            ..Config::default()
        };
        assert_eq!(config.max_log_size().value(), MIN_MAX_LOG_SIZE_BYTES);
        assert_eq!(config.trim_batch().value(), MIN_TRIM_BATCH);
    }

    #[test]
    fn log_file_path_uses_configured_directory() {
        let config = Config {
            log_directory: Some(PathBuf::from("logs")),
            ..Config::default()
        };
        assert_eq!(config.log_file_path(), PathBuf::from("logs").join(LOG_FILE_NAME));
    }

    #[test]
    fn report_filename_defaults() {
        assert_eq!(Config::default().report_filename(), DEFAULT_REPORT_FILENAME);
    }
}
