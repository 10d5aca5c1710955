//! Error types for the waterfall engine.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose
//! via `?` and `From` conversions at the host boundary.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level host error (binary, terminal runtime)
//!   - [`GeometryError`] - Invalid column geometry at session start
//!   - [`FetchError`] - Data source failures
//!   - `ConfigError`, `LoggingError`, `std::io::Error`
//! - [`AssetError`] - Why an item's asset did not produce a usable size
//! - [`ResolveError`] - Collaborator contract violations on the pending buffer
//!
//! # Recovery Strategy
//!
//! The layout core has no fatal error class. Asset failures consume their
//! sequence slot and are skipped, fetch failures return pagination to idle,
//! and resolve violations are logged and ignored. Only session construction
//! (`GeometryError`) and host setup (config, logging, terminal) can fail hard.

use super::identifiers::{AssetRef, PageNumber, SequenceIndex};
use crate::config::ConfigError;
use crate::logging::LoggingError;
use thiserror::Error;

/// Top-level host error encompassing all fatal failure modes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Column geometry is unusable.
    #[error("Invalid layout geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// The data source failed in a way the host cannot recover from
    /// (e.g. the manifest is missing at startup).
    #[error("Data source error: {0}")]
    Fetch(#[from] FetchError),

    /// Terminal or filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an asset did not yield a usable natural size.
///
/// Carried on skipped slots; never propagated as a crash.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    /// The loader reported a failure for this asset.
    #[error("asset {asset} failed to load: {reason}")]
    LoadFailed {
        /// The asset that failed.
        asset: AssetRef,
        /// Loader-provided reason.
        reason: String,
    },

    /// The loader succeeded but reported a size that cannot be scaled.
    #[error("invalid natural dimensions {width}x{height}")]
    InvalidDimensions {
        /// Reported natural width.
        width: f64,
        /// Reported natural height.
        height: f64,
    },
}

/// Contract violation by an asset loader resolving the pending buffer.
///
/// These are logged and ignored; the layout continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The slot already reached a terminal state.
    #[error("slot {index} resolved twice")]
    DoubleResolve {
        /// Offending sequence index.
        index: SequenceIndex,
    },

    /// No slot was ever allocated at this index.
    #[error("slot {index} was never allocated ({allocated} slots exist)")]
    UnknownSlot {
        /// Offending sequence index.
        index: SequenceIndex,
        /// Number of allocated slots at the time of the call.
        allocated: usize,
    },
}

/// Data source failure for one page request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source reported an application-level error for the page.
    #[error("page {page} rejected by source: {reason}")]
    Rejected {
        /// Page that was requested.
        page: PageNumber,
        /// Source-provided reason.
        reason: String,
    },

    /// The source is not reachable or its backing store is missing.
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    /// I/O failure while reading the source.
    #[error("I/O error reading data source: {0}")]
    Io(String),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

/// Column geometry that cannot produce a positive column width.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Column count must be at least one.
    #[error("column count must be at least 1")]
    NoColumns,

    /// Container width must be finite and positive.
    #[error("container width must be finite and positive (got {0})")]
    InvalidContainerWidth(f64),

    /// Gaps must be finite and non-negative.
    #[error("gap must be finite and non-negative (got {0})")]
    InvalidGap(f64),

    /// The gaps consume the whole container.
    #[error("columns of width {column_width} do not fit: {columns} columns in {container_width} with gap {gap}")]
    NoRoomForColumns {
        /// Requested column count.
        columns: usize,
        /// Container width.
        container_width: f64,
        /// Horizontal gap between columns.
        gap: f64,
        /// Resulting (non-positive) column width.
        column_width: f64,
    },
}
