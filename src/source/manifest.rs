//! JSONL manifest data source.
//!
//! One entry per line:
//!
//! ```text
//! {"asset": "img/cat.jpg", "width": 640, "height": 480, "latency_ms": 30, "data": {"title": "Cat"}}
//! {"asset": "img/missing.jpg", "fail": true}
//! {"block_height": 120, "data": {"title": "Ad slot"}}
//! ```
//!
//! Blank lines are ignored; malformed lines are logged and skipped. The
//! entries are served in fixed-size pages starting at the configured first
//! page; a page past the end is empty.

use super::DataSource;
use crate::model::{AssetRef, FetchError, ItemRecord, PageNumber};
use crate::pagination::FetchRequest;
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// One manifest line.
///
/// `width`, `height`, `fail` and `latency_ms` describe how the asset
/// behaves when loaded; the rest becomes the item record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    /// Asset reference, absent for text blocks.
    #[serde(default)]
    pub asset: Option<AssetRef>,
    /// Natural width of the asset.
    #[serde(default)]
    pub width: Option<f64>,
    /// Natural height of the asset.
    #[serde(default)]
    pub height: Option<f64>,
    /// Make the asset fail to load.
    #[serde(default)]
    pub fail: bool,
    /// Simulated load time.
    #[serde(default)]
    pub latency_ms: u64,
    /// Measured height of an asset-less block.
    #[serde(default)]
    pub block_height: Option<f64>,
    /// Render data passed through untouched.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ManifestEntry {
    /// The item record a data source delivers.
    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            asset: self.asset.clone(),
            block_height: self.block_height,
            data: self.data.clone(),
        }
    }
}

/// Paged view over a parsed manifest.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    entries: Vec<ManifestEntry>,
    page_size: usize,
    first_page: PageNumber,
}

impl ManifestSource {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unavailable` if the file does not exist and
    /// `FetchError::Io` if it cannot be read.
    pub fn open(
        path: impl AsRef<Path>,
        page_size: usize,
        first_page: PageNumber,
    ) -> Result<Self, FetchError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FetchError::Unavailable(format!(
                "manifest not found: {}",
                path.display()
            )));
        }
        let file = std::fs::File::open(path)?;
        let source = Self::from_reader(BufReader::new(file), page_size, first_page)?;
        info!(
            path = %path.display(),
            entries = source.entries.len(),
            page_size = source.page_size,
            "Manifest loaded"
        );
        Ok(source)
    }

    /// Parse a manifest from any buffered reader.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Io` if reading fails. Malformed lines are not
    /// errors.
    pub fn from_reader(
        reader: impl BufRead,
        page_size: usize,
        first_page: PageNumber,
    ) -> Result<Self, FetchError> {
        let mut entries = Vec::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ManifestEntry>(trimmed) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(line = line_number + 1, %err, "Skipping malformed manifest line");
                }
            }
        }
        Ok(Self::from_entries(entries, page_size, first_page))
    }

    /// A zero page size is treated as one.
    pub fn from_entries(
        entries: Vec<ManifestEntry>,
        page_size: usize,
        first_page: PageNumber,
    ) -> Self {
        Self {
            entries,
            page_size: page_size.max(1),
            first_page,
        }
    }

    /// All parsed entries, in file order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Items per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Entries on `page`, empty past the end.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Rejected` for pages before the first page.
    pub fn page(&self, page: PageNumber) -> Result<&[ManifestEntry], FetchError> {
        let Some(offset) = page.get().checked_sub(self.first_page.get()) else {
            return Err(FetchError::Rejected {
                page,
                reason: format!("pages start at {}", self.first_page),
            });
        };
        let start = (offset as usize)
            .saturating_mul(self.page_size)
            .min(self.entries.len());
        let end = start.saturating_add(self.page_size).min(self.entries.len());
        Ok(&self.entries[start..end])
    }
}

impl DataSource for ManifestSource {
    fn fetch_page(&mut self, request: &FetchRequest) -> Result<Vec<ItemRecord>, FetchError> {
        let entries = self.page(request.page)?;
        debug!(page = %request.page, items = entries.len(), "Serving manifest page");
        Ok(entries.iter().map(ManifestEntry::to_record).collect())
    }
}
