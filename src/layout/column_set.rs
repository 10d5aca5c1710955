//! ColumnSet - N columns with accumulated heights.
//!
//! Heights only grow: items are appended, never removed, so each column's
//! accumulated height is monotonically non-decreasing for the lifetime of
//! the set.

use super::geometry::ColumnGeometry;
use crate::model::{ColumnIndex, GeometryError};

/// One column of the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    index: ColumnIndex,
    height: f64,
    items: usize,
}

impl Column {
    /// Position of this column, 0 is leftmost.
    pub fn index(&self) -> ColumnIndex {
        self.index
    }

    /// Accumulated height of everything placed in this column.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of items placed in this column.
    pub fn items(&self) -> usize {
        self.items
    }
}

/// Where a height contribution landed inside a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnPosition {
    /// Column height before the contribution (the item's top offset).
    pub top: f64,
    /// 0-based position of the item within its column.
    pub row: usize,
}

/// Fixed set of columns owned by a single layout session.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    /// Creates `count` empty columns.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoColumns` if `count` is zero.
    pub fn new(count: usize) -> Result<Self, GeometryError> {
        if count == 0 {
            return Err(GeometryError::NoColumns);
        }
        Ok(Self::empty(count))
    }

    /// Empty columns for validated geometry (which always has at least one).
    pub fn from_geometry(geometry: &ColumnGeometry) -> Self {
        Self::empty(geometry.columns())
    }

    fn empty(count: usize) -> Self {
        let columns = (0..count)
            .map(|i| Column {
                index: ColumnIndex::new(i),
                height: 0.0,
                items: 0,
            })
            .collect();
        Self { columns }
    }

    /// Index of the shortest column. Lowest index wins among equal minima.
    pub fn shortest_column(&self) -> ColumnIndex {
        let mut best = &self.columns[0];
        for column in &self.columns[1..] {
            // Strict comparison keeps the earlier column on ties
            if column.height < best.height {
                best = column;
            }
        }
        best.index
    }

    /// Adds `height_delta` to a column.
    ///
    /// Returns the column's height *before* the increment together with
    /// the item's row within the column.
    ///
    /// # Panics
    ///
    /// Panics if `column` is out of range.
    pub fn place(&mut self, column: ColumnIndex, height_delta: f64) -> ColumnPosition {
        debug_assert!(
            height_delta >= 0.0,
            "height contribution must be non-negative (got {height_delta})"
        );
        let col = &mut self.columns[column.get()];
        let position = ColumnPosition {
            top: col.height,
            row: col.items,
        };
        col.height += height_delta.max(0.0);
        col.items += 1;
        position
    }

    /// Height of the tallest column.
    pub fn tallest_height(&self) -> f64 {
        self.columns
            .iter()
            .map(|c| c.height)
            .fold(0.0, f64::max)
    }

    /// Height of the shortest column.
    pub fn shortest_height(&self) -> f64 {
        self.columns[self.shortest_column().get()].height
    }

    /// Accumulated heights in column order.
    pub fn heights(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.height).collect()
    }

    /// Column at `index`, if it exists.
    pub fn column(&self, index: ColumnIndex) -> Option<&Column> {
        self.columns.get(index.get())
    }

    /// Columns left to right.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Number of columns (always >= 1).
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a ColumnSet has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
