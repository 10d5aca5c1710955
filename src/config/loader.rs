//! Configuration file loading with precedence handling.

use super::ResizePolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "WATERFALL_CONFIG";
/// Environment override for the column count.
pub const COLUMNS_ENV: &str = "WATERFALL_COLUMNS";
/// Environment override for the page size.
pub const PAGE_SIZE_ENV: &str = "WATERFALL_PAGE_SIZE";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
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
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/waterfall/config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Number of columns.
    #[serde(default)]
    pub columns: Option<usize>,

    /// Container width in layout units.
    #[serde(default)]
    pub container_width: Option<f64>,

    /// Gap between adjacent columns.
    #[serde(default)]
    pub horizontal_gap: Option<f64>,

    /// Gap added below every item.
    #[serde(default)]
    pub vertical_gap: Option<f64>,

    /// Distance from the bottom at which the next page is requested.
    #[serde(default)]
    pub scroll_threshold: Option<f64>,

    /// Minimum milliseconds between scroll evaluations.
    #[serde(default)]
    pub scroll_interval_ms: Option<u64>,

    /// First page number requested.
    #[serde(default)]
    pub first_page: Option<u32>,

    /// Items per page served by the manifest source.
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Behaviour on container resize.
    #[serde(default)]
    pub resize_policy: Option<ResizePolicy>,

    /// Static query parameters sent with every page request.
    #[serde(default)]
    pub params: Option<BTreeMap<String, String>>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Number of columns.
    pub columns: usize,
    /// Container width in layout units.
    pub container_width: f64,
    /// Gap between columns.
    pub horizontal_gap: f64,
    /// Gap added below every item.
    pub vertical_gap: f64,
    /// Fetch when the tallest column is within this distance of the viewport bottom.
    pub scroll_threshold: f64,
    /// Minimum milliseconds between scroll evaluations.
    pub scroll_interval_ms: u64,
    /// First page requested.
    pub first_page: u32,
    /// Items per manifest page.
    pub page_size: usize,
    /// Behavior when the container width changes.
    pub resize_policy: ResizePolicy,
    /// Static query parameters sent with every request.
    pub params: BTreeMap<String, String>,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            container_width: 960.0,
            horizontal_gap: 0.0,
            vertical_gap: 10.0,
            scroll_threshold: 0.0,
            scroll_interval_ms: 100,
            first_page: 1,
            page_size: 20,
            resize_policy: ResizePolicy::Keep,
            params: BTreeMap::new(),
            log_file_path: default_log_path(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/waterfall/waterfall.log` on Linux, or the
/// platform's equivalent. Falls back to the current directory if no state
/// directory can be determined.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("waterfall").join("waterfall.log")
    } else {
        PathBuf::from("waterfall.log")
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
/// Returns `~/.config/waterfall/config.toml` on Linux, appropriate path on
/// other platforms. `None` if no config directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("waterfall").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `WATERFALL_CONFIG` environment variable
/// 3. Default path `~/.config/waterfall/config.toml`
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

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
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
        columns: config.columns.unwrap_or(defaults.columns),
        container_width: config.container_width.unwrap_or(defaults.container_width),
        horizontal_gap: config.horizontal_gap.unwrap_or(defaults.horizontal_gap),
        vertical_gap: config.vertical_gap.unwrap_or(defaults.vertical_gap),
        scroll_threshold: config.scroll_threshold.unwrap_or(defaults.scroll_threshold),
        scroll_interval_ms: config
            .scroll_interval_ms
            .unwrap_or(defaults.scroll_interval_ms),
        first_page: config.first_page.unwrap_or(defaults.first_page),
        page_size: config.page_size.unwrap_or(defaults.page_size),
        resize_policy: config.resize_policy.unwrap_or(defaults.resize_policy),
        params: config.params.unwrap_or(defaults.params),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `WATERFALL_COLUMNS`: Override column count
/// - `WATERFALL_PAGE_SIZE`: Override page size
///
/// Values that do not parse as positive integers are ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Some(columns) = positive_env(COLUMNS_ENV) {
        config.columns = columns;
    }
    if let Some(page_size) = positive_env(PAGE_SIZE_ENV) {
        config.page_size = page_size;
    }
    config
}

fn positive_env(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

/// Overrides taken from command-line flags that were explicitly set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// `--columns`
    pub columns: Option<usize>,
    /// `--width`
    pub container_width: Option<f64>,
    /// `--page-size`
    pub page_size: Option<usize>,
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, cli: CliOverrides) -> ResolvedConfig {
    if let Some(columns) = cli.columns {
        config.columns = columns;
    }
    if let Some(width) = cli.container_width {
        config.container_width = width;
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
