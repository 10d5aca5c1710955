//! Column geometry fixed at session start.

use crate::model::GeometryError;

/// Container and gap dimensions that determine the shared column width.
///
/// The column width is computed once, when the geometry is built. Heights of
/// image items are always scaled against this width, so a later viewport
/// resize does not disturb already-accumulated column heights unless the
/// session is explicitly relaid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnGeometry {
    columns: usize,
    container_width: f64,
    horizontal_gap: f64,
    vertical_gap: f64,
    column_width: f64,
}

impl ColumnGeometry {
    /// Build and validate geometry.
    ///
    /// `column_width = (container_width - (columns - 1) * horizontal_gap) / columns`
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if there are no columns, a dimension is not
    /// finite, a gap is negative, or the gaps leave no positive column width.
    pub fn new(
        columns: usize,
        container_width: f64,
        horizontal_gap: f64,
        vertical_gap: f64,
    ) -> Result<Self, GeometryError> {
        if columns == 0 {
            return Err(GeometryError::NoColumns);
        }
        if !container_width.is_finite() || container_width <= 0.0 {
            return Err(GeometryError::InvalidContainerWidth(container_width));
        }
        for gap in [horizontal_gap, vertical_gap] {
            if !gap.is_finite() || gap < 0.0 {
                return Err(GeometryError::InvalidGap(gap));
            }
        }

        let column_width =
            (container_width - (columns as f64 - 1.0) * horizontal_gap) / columns as f64;
        if column_width <= 0.0 {
            return Err(GeometryError::NoRoomForColumns {
                columns,
                container_width,
                gap: horizontal_gap,
                column_width,
            });
        }

        Ok(Self {
            columns,
            container_width,
            horizontal_gap,
            vertical_gap,
            column_width,
        })
    }

    /// Same gaps and column count, different container width.
    pub fn with_container_width(&self, container_width: f64) -> Result<Self, GeometryError> {
        Self::new(
            self.columns,
            container_width,
            self.horizontal_gap,
            self.vertical_gap,
        )
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Container width in layout units.
    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Gap between adjacent columns.
    pub fn horizontal_gap(&self) -> f64 {
        self.horizontal_gap
    }

    /// Gap added below every item.
    pub fn vertical_gap(&self) -> f64 {
        self.vertical_gap
    }

    /// Shared width of every column.
    pub fn column_width(&self) -> f64 {
        self.column_width
    }

    /// Horizontal offset of a column's left edge within the container.
    pub fn column_left(&self, column: usize) -> f64 {
        column as f64 * (self.column_width + self.horizontal_gap)
    }
}
