//! Greedy placement rule: shortest column wins.

use super::column_set::ColumnSet;
use super::geometry::ColumnGeometry;
use crate::model::{ColumnIndex, Extent, SequenceIndex};

/// Result of placing one item. The render sink's source of truth for where
/// an item goes; any markup attributes are derived from this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Item that was placed.
    pub sequence: SequenceIndex,
    /// Column the item went into.
    pub column: ColumnIndex,
    /// Offset of the item's top edge within its column.
    pub top: f64,
    /// Height contribution, vertical gap included.
    pub height: f64,
    /// 0-based position of the item within its column.
    pub row: usize,
}

impl Placement {
    /// Offset just below this item (including its trailing gap).
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Append-only placement of resolved items into a ColumnSet.
///
/// Already-placed items are never rebalanced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRule {
    geometry: ColumnGeometry,
}

impl PlacementRule {
    /// Rule placing into columns of `geometry`.
    pub fn new(geometry: ColumnGeometry) -> Self {
        Self { geometry }
    }

    /// Geometry the rule scales against.
    pub fn geometry(&self) -> &ColumnGeometry {
        &self.geometry
    }

    /// Height an extent contributes to its column.
    ///
    /// Natural sizes scale to the column width:
    /// `column_width * natural_height / natural_width + vertical_gap`.
    /// Measured heights are used as-is plus the vertical gap.
    pub fn contribution(&self, extent: &Extent) -> f64 {
        let gap = self.geometry.vertical_gap();
        match *extent {
            Extent::Natural { width, height } => {
                self.geometry.column_width() * height / width + gap
            }
            Extent::Measured { height } => height + gap,
        }
    }

    /// Place one item into the shortest column.
    pub fn place(
        &self,
        columns: &mut ColumnSet,
        sequence: SequenceIndex,
        extent: &Extent,
    ) -> Placement {
        let column = columns.shortest_column();
        let height = self.contribution(extent);
        let position = columns.place(column, height);
        Placement {
            sequence,
            column,
            top: position.top,
            height,
            row: position.row,
        }
    }
}
