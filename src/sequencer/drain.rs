//! Sequencer - in-order draining of out-of-order completions.
//!
//! The sequencer owns the cursor: the next sequence index eligible for
//! placement. A drain walks forward from the cursor while slots are
//! terminal, placing successes and skipping failures, and stops at the first
//! unresolved slot. Whatever order assets complete in, item K+1 is never
//! placed before item K has resolved.

use super::events::LayoutEvent;
use super::pending_buffer::{PendingBuffer, SlotState};
use crate::layout::{ColumnSet, PlacementRule};
use crate::model::{AssetError, Extent, PageNumber, SequenceIndex};
use std::collections::VecDeque;
use std::ops::Range;
use tracing::{debug, info, warn};

/// Sequencer execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    /// Waiting for the slot at the cursor to resolve.
    #[default]
    Idle,
    /// Walking the resolved prefix.
    Draining,
}

/// An allocated page whose items have not all been drained yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Page the items arrived on.
    pub page: PageNumber,
    /// Raw sequence indices belonging to this page.
    pub range: Range<usize>,
}

/// Counts for one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    /// Items placed into a column.
    pub placed: usize,
    /// Failed items passed over.
    pub skipped: usize,
    /// Batches that finished draining.
    pub settled: usize,
}

impl DrainSummary {
    /// True if the cursor moved or a batch settled.
    pub fn made_progress(&self) -> bool {
        self.placed + self.skipped + self.settled > 0
    }
}

/// Sole writer of the cursor and sole reader-then-writer of the ColumnSet.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    cursor: SequenceIndex,
    state: SequencerState,
    outstanding: VecDeque<Batch>,
}

impl Sequencer {
    /// Sequencer with the cursor at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence index eligible for placement.
    pub fn cursor(&self) -> SequenceIndex {
        self.cursor
    }

    /// Whether a drain is in progress.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Batches allocated but not yet fully drained, oldest first.
    pub fn outstanding(&self) -> impl Iterator<Item = &Batch> {
        self.outstanding.iter()
    }

    /// Registers a freshly allocated page so `BatchSettled` can be emitted
    /// when the cursor passes its last index.
    pub fn track_batch(&mut self, page: PageNumber, range: Range<usize>) {
        debug!(page = %page, start = range.start, end = range.end, "Tracking batch");
        self.outstanding.push_back(Batch { page, range });
    }

    /// Drains the resolved prefix at the cursor into `columns`.
    ///
    /// Appends `Placed`, `Skipped` and `BatchSettled` events to `events` in
    /// the order they happen.
    pub fn drain(
        &mut self,
        buffer: &mut PendingBuffer,
        columns: &mut ColumnSet,
        rule: &PlacementRule,
        events: &mut Vec<LayoutEvent>,
    ) -> DrainSummary {
        self.state = SequencerState::Draining;
        let mut summary = DrainSummary::default();

        // Empty batches at the cursor settle without any slot resolving
        summary.settled += self.settle_batches(events);

        loop {
            let index = self.cursor;
            let step = match buffer.peek(index) {
                None | Some(SlotState::Unresolved) => break,
                Some(SlotState::ResolvedOk(extent)) => Ok(*extent),
                Some(SlotState::ResolvedFail(reason)) => Err(reason.clone()),
            };
            let item = buffer.take_item(index);

            match (step, item) {
                (Ok(extent), Some(item)) if !fits(columns, rule, &extent) => {
                    warn!(sequence = %index, ?extent, "Scaled height overflows; skipping item");
                    summary.skipped += 1;
                    events.push(LayoutEvent::Skipped {
                        sequence: index,
                        item,
                        reason: unplaceable(extent),
                    });
                }
                (Ok(extent), Some(item)) => {
                    let placement = rule.place(columns, index, &extent);
                    debug!(
                        sequence = %index,
                        column = %placement.column,
                        top = placement.top,
                        height = placement.height,
                        "Placed item"
                    );
                    summary.placed += 1;
                    events.push(LayoutEvent::Placed {
                        placement,
                        extent,
                        item,
                    });
                }
                (Err(reason), Some(item)) => {
                    debug!(sequence = %index, %reason, "Skipped failed item");
                    summary.skipped += 1;
                    events.push(LayoutEvent::Skipped {
                        sequence: index,
                        item,
                        reason,
                    });
                }
                (_, None) => {
                    warn!(sequence = %index, "Slot at cursor has no item; advancing");
                }
            }

            self.cursor = index.next();
            summary.settled += self.settle_batches(events);
        }

        self.state = SequencerState::Idle;
        summary
    }

    fn settle_batches(&mut self, events: &mut Vec<LayoutEvent>) -> usize {
        let mut settled = 0;
        while let Some(batch) = self.outstanding.front() {
            if batch.range.end > self.cursor.get() {
                break;
            }
            let page = batch.page;
            self.outstanding.pop_front();
            info!(page = %page, cursor = %self.cursor, "Batch settled");
            events.push(LayoutEvent::BatchSettled { page });
            settled += 1;
        }
        settled
    }
}

/// Whether placing `extent` keeps every column height finite.
///
/// Finite natural sizes with an extreme aspect ratio can still scale to
/// infinity, which would pin the tallest column and stall pagination.
fn fits(columns: &ColumnSet, rule: &PlacementRule, extent: &Extent) -> bool {
    (columns.shortest_height() + rule.contribution(extent)).is_finite()
}

fn unplaceable(extent: Extent) -> AssetError {
    match extent {
        Extent::Natural { width, height } => AssetError::InvalidDimensions { width, height },
        Extent::Measured { height } => AssetError::InvalidDimensions { width: 0.0, height },
    }
}
