//! File logging for the viewer and headless runs.
//!
//! The terminal belongs to the board, so everything goes to a plain-text
//! file instead (`tail -f` it from another terminal). `RUST_LOG` selects the
//! level; `info` shows batch lifecycle, `debug` shows every placement.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Failure to set up file logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("cannot create log directory {}: {source}", .dir.display())]
    CreateDir {
        /// Directory that was being created.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The path ends in `..`, `/` or is not valid UTF-8.
    #[error("log path {} does not name a file", .0.display())]
    NoFileName(PathBuf),

    /// `init` was already called in this process.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Split a log path into the directory to create and the file name to open.
/// A bare file name lands in the current directory.
fn split_log_path(log_path: &Path) -> Result<(&Path, &str), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LoggingError::NoFileName(log_path.to_path_buf()))?;
    let dir = log_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((dir, file_name))
}

/// Install the global subscriber, appending to `log_path`.
///
/// # Errors
///
/// Fails if the path names no file, its directory cannot be created, or a
/// subscriber was installed earlier in this process.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let (dir, file_name) = split_log_path(log_path)?;
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(tracing_appender::rolling::never(dir, file_name))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    info!(
        path = %log_path.display(),
        version = env!("CARGO_PKG_VERSION"),
        "waterfall logging started"
    );
    Ok(())
}
