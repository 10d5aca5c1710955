//! Configuration module.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, CliOverrides, ConfigError,
    ConfigFile, ResolvedConfig,
};

use serde::Deserialize;

/// What a session does when the container width changes mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Keep the column width computed at session start. Item heights stay
    /// scaled against the original width and nothing moves.
    #[default]
    Keep,
    /// Recompute the column width and lay every placed item out again.
    Relayout,
}
