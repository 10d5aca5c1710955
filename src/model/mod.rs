//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod item;

// Re-export for convenience
pub use error::{AppError, AssetError, FetchError, GeometryError, ResolveError};
pub use identifiers::{
    AssetRef, ColumnIndex, InvalidAssetRef, PageNumber, SequenceIndex, SessionId,
};
pub use item::{Extent, Item, ItemRecord, LoadOutcome};
