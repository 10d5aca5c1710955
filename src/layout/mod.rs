//! Layout layer - column geometry, column heights, and placement.
//!
//! # Module Structure
//!
//! - `geometry`: ColumnGeometry - container width, gaps, fixed column width
//! - `column_set`: ColumnSet - per-column accumulated heights
//! - `placement`: PlacementRule and Placement - greedy shortest-column rule
//! - `height_index`: HeightIndex - O(log n) prefix sums for visible-range queries

pub mod column_set;
pub mod geometry;
pub mod height_index;
pub mod placement;

pub use column_set::{Column, ColumnPosition, ColumnSet};
pub use geometry::ColumnGeometry;
pub use height_index::HeightIndex;
pub use placement::{Placement, PlacementRule};
