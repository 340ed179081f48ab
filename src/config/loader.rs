//! Configuration file loading with precedence handling.

use crate::state::{ControllerSettings, DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ROCKOUT_SEARCH_CONFIG";
/// Environment override for the debounce interval in milliseconds.
pub const DEBOUNCE_ENV: &str = "ROCKOUT_SEARCH_DEBOUNCE_MS";
/// Environment override for the page size.
pub const PAGE_SIZE_ENV: &str = "ROCKOUT_SEARCH_PAGE_SIZE";

const APP_DIR: &str = "rockout-search";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting has a value outside its allowed range.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Setting or environment variable name.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional; anything unset falls back to the built-in default.
/// Corresponds to `~/.config/rockout-search/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Quiet period before a typed query is committed, in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Items requested per page.
    #[serde(default)]
    pub page_size: Option<usize>,

    /// How close to the end of the list a visible item must be to trigger
    /// the next page.
    #[serde(default)]
    pub prefetch_distance: Option<usize>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Quiet period before a typed query is committed, in milliseconds.
    pub debounce_ms: u64,
    /// Unchecked until [`ResolvedConfig::validate`]; zero is rejected there.
    pub page_size: usize,
    /// Distance from the end of the list at which the next page is requested.
    pub prefetch_distance: usize,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            page_size: DEFAULT_PAGE_SIZE.get(),
            prefetch_distance: 0,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Check the resolved values and build controller settings from them.
    ///
    /// A zero debounce is allowed and commits on the next poll.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `page_size` is zero.
    pub fn validate(&self) -> Result<ControllerSettings, ConfigError> {
        let page_size =
            NonZeroUsize::new(self.page_size).ok_or_else(|| ConfigError::InvalidValue {
                key: "page_size".to_string(),
                reason: "must be at least 1".to_string(),
            })?;

        Ok(ControllerSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            page_size,
            prefetch_distance: self.prefetch_distance,
        })
    }
}

/// Overrides taken from command-line flags. `None` leaves the setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// From `--debounce-ms`.
    pub debounce_ms: Option<u64>,
    /// From `--page-size`.
    pub page_size: Option<usize>,
    /// Prefetch distance override.
    pub prefetch_distance: Option<usize>,
    /// From `--log-file`.
    pub log_file_path: Option<PathBuf>,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/rockout-search/rockout-search.log` on Linux, or the
/// platform equivalent. Falls back to the current directory if no state
/// directory is known.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join(APP_DIR).join("rockout-search.log")
    } else {
        PathBuf::from("rockout-search.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/rockout-search/config.toml` on Linux.
/// Returns `None` if no config directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `ROCKOUT_SEARCH_CONFIG` environment variable
/// 3. Default path `~/.config/rockout-search/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Some(env_path) = std::env::var_os(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `ROCKOUT_SEARCH_DEBOUNCE_MS` and `ROCKOUT_SEARCH_PAGE_SIZE`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a variable is set but is not a
/// non-negative integer.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Some(debounce_ms) = read_env_number::<u64>(DEBOUNCE_ENV)? {
        config.debounce_ms = debounce_ms;
    }
    if let Some(page_size) = read_env_number::<usize>(PAGE_SIZE_ENV)? {
        config.page_size = page_size;
    }
    Ok(config)
}

fn read_env_number<N: std::str::FromStr>(key: &str) -> Result<Option<N>, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a non-negative integer, got {:?}", raw),
        })
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        debounce_ms: config.debounce_ms.unwrap_or(defaults.debounce_ms),
        page_size: config.page_size.unwrap_or(defaults.page_size),
        prefetch_distance: config
            .prefetch_distance
            .unwrap_or(defaults.prefetch_distance),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, overrides: CliOverrides) -> ResolvedConfig {
    if let Some(debounce_ms) = overrides.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    if let Some(page_size) = overrides.page_size {
        config.page_size = page_size;
    }
    if let Some(prefetch_distance) = overrides.prefetch_distance {
        config.prefetch_distance = prefetch_distance;
    }
    if let Some(log_file_path) = overrides.log_file_path {
        config.log_file_path = log_file_path;
    }
    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
