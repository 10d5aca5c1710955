//! Board - terminal render sink for placed tiles.
//!
//! Each column keeps its tiles in placement order together with a
//! `HeightIndex` of their heights in terminal rows, so drawing a viewport
//! only touches the tiles that intersect it.

use crate::layout::{HeightIndex, Placement};
use crate::model::{PageNumber, SequenceIndex};
use crate::sequencer::{LayoutEvent, RenderSink};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;
use std::collections::BTreeMap;
use std::fmt;
use unicode_width::UnicodeWidthChar;

/// Smallest tile drawn: a top and a bottom border.
const MIN_TILE_ROWS: usize = 2;

/// What the feed is doing, as far as the board has been told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Waiting on a page.
    Fetching(PageNumber),
    /// The last page request failed.
    Failed(PageNumber),
    /// The data source has no more pages.
    Exhausted,
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStatus::Idle => f.write_str("idle"),
            FeedStatus::Fetching(page) => write!(f, "loading page {page}"),
            FeedStatus::Failed(page) => write!(f, "page {page} failed"),
            FeedStatus::Exhausted => f.write_str("end of feed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tile {
    sequence: SequenceIndex,
    label: String,
    rows: usize,
}

#[derive(Debug, Clone, Default)]
struct BoardColumn {
    tiles: Vec<Tile>,
    rows: HeightIndex,
}

impl BoardColumn {
    fn push(&mut self, tile: Tile) {
        self.rows.push(tile.rows);
        self.tiles.push(tile);
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.rows.clear();
    }

    /// First row of tile `index`.
    fn top_row(&self, index: usize) -> usize {
        if index == 0 {
            0
        } else {
            self.rows.prefix_sum(index - 1)
        }
    }
}

/// Render sink that draws placed items as boxed tiles in columns.
#[derive(Debug, Clone)]
pub struct Board {
    columns: Vec<BoardColumn>,
    /// Labels lifted off cleared tiles during a relayout, claimed again by
    /// each `Repositioned` event.
    relayout_labels: BTreeMap<SequenceIndex, String>,
    /// Layout units represented by one terminal row.
    units_per_row: f64,
    scroll: usize,
    placed: usize,
    skipped: usize,
    status: FeedStatus,
}

impl Board {
    /// Empty board with `columns` columns.
    ///
    /// `units_per_row` converts layout heights to terminal rows; values
    /// below one (or NaN) are treated as one.
    pub fn new(columns: usize, units_per_row: f64) -> Self {
        Self {
            columns: vec![BoardColumn::default(); columns.max(1)],
            relayout_labels: BTreeMap::new(),
            units_per_row: units_per_row.max(1.0),
            scroll: 0,
            placed: 0,
            skipped: 0,
            status: FeedStatus::Idle,
        }
    }

    /// Number of columns drawn.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Items placed so far.
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Items skipped because their asset failed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Feed status shown in the header.
    pub fn status(&self) -> FeedStatus {
        self.status
    }

    /// First visible row.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Layout units per terminal row.
    pub fn units_per_row(&self) -> f64 {
        self.units_per_row
    }

    /// Rows in the tallest column.
    pub fn total_rows(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.rows.total())
            .max()
            .unwrap_or(0)
    }

    /// Sequence indices of the tiles in `column`, top to bottom.
    pub fn column_sequences(&self, column: usize) -> Vec<SequenceIndex> {
        self.columns
            .get(column)
            .map(|c| c.tiles.iter().map(|t| t.sequence).collect())
            .unwrap_or_default()
    }

    /// Scroll by `delta` rows, clamped so the last row stays reachable.
    pub fn scroll_by(&mut self, delta: isize, viewport_rows: usize) {
        let max = self.max_scroll(viewport_rows);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }

    /// Scroll to the first row.
    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    /// Scroll so the last row is at the bottom.
    pub fn scroll_to_bottom(&mut self, viewport_rows: usize) {
        self.scroll = self.max_scroll(viewport_rows);
    }

    /// Bottom edge of the viewport in layout units.
    ///
    /// Tile rows round up, so at the end of the board this is never short
    /// of the tallest column's layout height.
    pub fn viewport_bottom(&self, viewport_rows: usize) -> f64 {
        (self.scroll + viewport_rows) as f64 * self.units_per_row
    }

    fn max_scroll(&self, viewport_rows: usize) -> usize {
        self.total_rows().saturating_sub(viewport_rows)
    }

    fn rows_for(&self, height: f64) -> usize {
        let rows = (height / self.units_per_row).ceil();
        if rows.is_finite() && rows > 0.0 {
            (rows as usize).max(MIN_TILE_ROWS)
        } else {
            MIN_TILE_ROWS
        }
    }

    fn push_tile(&mut self, placement: &Placement, label: String) {
        let column = placement.column.get();
        if column >= self.columns.len() {
            self.columns.resize_with(column + 1, BoardColumn::default);
        }
        let rows = self.rows_for(placement.height);
        self.columns[column].push(Tile {
            sequence: placement.sequence,
            label,
            rows,
        });
    }

    fn header(&self) -> String {
        format!(
            "{} placed | {} skipped | {}",
            self.placed, self.skipped, self.status
        )
    }
}

impl RenderSink for Board {
    fn handle(&mut self, event: &LayoutEvent) {
        match event {
            LayoutEvent::FetchStarted { page } => self.status = FeedStatus::Fetching(*page),
            LayoutEvent::Placed {
                placement, item, ..
            } => {
                self.push_tile(placement, item.label());
                self.placed += 1;
            }
            LayoutEvent::Skipped { .. } => self.skipped += 1,
            LayoutEvent::BatchSettled { .. } => self.status = FeedStatus::Idle,
            LayoutEvent::FetchFailed { page, .. } => self.status = FeedStatus::Failed(*page),
            LayoutEvent::FeedExhausted { .. } => self.status = FeedStatus::Exhausted,
            LayoutEvent::Relayout { .. } => {
                for column in &mut self.columns {
                    for tile in column.tiles.drain(..) {
                        self.relayout_labels.insert(tile.sequence, tile.label);
                    }
                    column.clear();
                }
                self.scroll = 0;
            }
            LayoutEvent::Repositioned { placement } => {
                let label = self
                    .relayout_labels
                    .remove(&placement.sequence)
                    .unwrap_or_else(|| format!("#{}", placement.sequence));
                self.push_tile(placement, label);
            }
        }
    }
}

impl Widget for &Board {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        buf.set_stringn(
            area.x,
            area.y,
            self.header(),
            area.width as usize,
            Style::default().add_modifier(Modifier::BOLD),
        );

        let body_height = (area.height - 1) as usize;
        let count = u16::try_from(self.columns.len())
            .unwrap_or(u16::MAX)
            .max(1);
        let cell_width = area.width.saturating_sub(count - 1) / count;
        if body_height == 0 || (cell_width as usize) < MIN_TILE_ROWS + 1 {
            return;
        }

        for (c, column) in self.columns.iter().enumerate() {
            let x = area.x + c as u16 * (cell_width + 1);
            for index in column.rows.visible_range(self.scroll, body_height) {
                let tile = &column.tiles[index];
                let top = column.top_row(index);
                for k in 0..tile.rows {
                    let row = top + k;
                    if row < self.scroll {
                        continue;
                    }
                    let y = row - self.scroll;
                    if y >= body_height {
                        break;
                    }
                    let line = tile_line(k, tile.rows, cell_width as usize, &tile.label);
                    buf.set_string(x, area.y + 1 + y as u16, line, Style::default());
                }
            }
        }
    }
}

/// Row `k` of a boxed tile `rows` tall and `width` cells wide, with the
/// label in the top border.
fn tile_line(k: usize, rows: usize, width: usize, label: &str) -> String {
    let inner = width.saturating_sub(2);
    if k == 0 {
        let title = truncate_to_width(label, inner);
        let used: usize = title.chars().filter_map(UnicodeWidthChar::width).sum();
        format!("┌{}{}┐", title, "─".repeat(inner - used))
    } else if k + 1 == rows {
        format!("└{}┘", "─".repeat(inner))
    } else {
        format!("│{}│", " ".repeat(inner))
    }
}

fn truncate_to_width(text: &str, max: usize) -> String {
    let mut width = 0;
    text.chars()
        .take_while(|ch| {
            width += ch.width().unwrap_or(0);
            width <= max
        })
        .collect()
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
