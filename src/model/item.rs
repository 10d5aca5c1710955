//! Content items and asset-load outcomes.

use super::error::AssetError;
use super::identifiers::{AssetRef, PageNumber, SequenceIndex};
use serde::Deserialize;

/// An item as delivered by a data source, before it joins the stream.
///
/// `data` is opaque render data handed to the render sink untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ItemRecord {
    /// Asset whose natural size determines the item's height.
    ///
    /// `None` for pure text/HTML blocks; those resolve immediately using
    /// `block_height`.
    #[serde(default)]
    pub asset: Option<AssetRef>,

    /// Height measured by the host for asset-less blocks, in layout units.
    #[serde(default)]
    pub block_height: Option<f64>,

    /// Arbitrary render data.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ItemRecord {
    /// Record for an item backed by an asset.
    pub fn with_asset(asset: AssetRef) -> Self {
        Self {
            asset: Some(asset),
            block_height: None,
            data: serde_json::Value::Null,
        }
    }

    /// Record for an asset-less block of known height.
    pub fn block(height: f64) -> Self {
        Self {
            asset: None,
            block_height: Some(height),
            data: serde_json::Value::Null,
        }
    }

    /// Attach render data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// An item that has joined the stream. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    sequence: SequenceIndex,
    page: PageNumber,
    asset: Option<AssetRef>,
    data: serde_json::Value,
}

impl Item {
    /// Item joining the stream at `sequence` from `page`.
    pub fn new(
        sequence: SequenceIndex,
        page: PageNumber,
        asset: Option<AssetRef>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            sequence,
            page,
            asset,
            data,
        }
    }

    /// Position in the global stream.
    pub fn sequence(&self) -> SequenceIndex {
        self.sequence
    }

    /// Page the item arrived on.
    pub fn page(&self) -> PageNumber {
        self.page
    }

    /// Asset whose size decides the item's height.
    pub fn asset(&self) -> Option<&AssetRef> {
        self.asset.as_ref()
    }

    /// Opaque render data.
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// Display label: `data.title` when it is a string, else `#<sequence>`.
    pub fn label(&self) -> String {
        self.data
            .get("title")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.sequence))
    }
}

/// Result of loading (or measuring) one item.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Asset decoded; natural pixel size.
    Loaded {
        /// Natural width.
        width: f64,
        /// Natural height.
        height: f64,
    },
    /// Height already known in layout units (asset-less blocks).
    Measured {
        /// Height in layout units.
        height: f64,
    },
    /// Asset could not be loaded.
    Failed(AssetError),
}

/// Size information of a successfully resolved slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    /// Natural asset size, scaled to the column width at placement.
    Natural {
        /// Natural width.
        width: f64,
        /// Natural height.
        height: f64,
    },
    /// Height used as-is.
    Measured {
        /// Height in layout units.
        height: f64,
    },
}

impl LoadOutcome {
    /// Validate the outcome into a terminal slot result.
    ///
    /// Non-finite or non-positive natural sizes and negative measured
    /// heights become `InvalidDimensions` failures.
    pub fn into_extent(self) -> Result<Extent, AssetError> {
        match self {
            LoadOutcome::Loaded { width, height } => {
                let valid = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
                if valid {
                    Ok(Extent::Natural { width, height })
                } else {
                    Err(AssetError::InvalidDimensions { width, height })
                }
            }
            LoadOutcome::Measured { height } => {
                if height.is_finite() && height >= 0.0 {
                    Ok(Extent::Measured { height })
                } else {
                    Err(AssetError::InvalidDimensions { width: 0.0, height })
                }
            }
            LoadOutcome::Failed(err) => Err(err),
        }
    }
}
