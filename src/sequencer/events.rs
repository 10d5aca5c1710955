//! Layout events and the render sink that consumes them.

use crate::layout::Placement;
use crate::model::{AssetError, Extent, FetchError, Item, PageNumber, SequenceIndex};

/// Everything a render sink is told about.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    /// A page request was issued.
    FetchStarted {
        /// Page being requested.
        page: PageNumber,
    },

    /// An item was placed. Emitted strictly in sequence order.
    Placed {
        /// Where the item went.
        placement: Placement,
        /// Size it was placed with.
        extent: Extent,
        /// The item itself, for rendering.
        item: Item,
    },

    /// An item's asset failed; its sequence slot was consumed without
    /// occupying layout space. Sinks wanting a "broken" placeholder key off
    /// this event.
    Skipped {
        /// Slot that was consumed.
        sequence: SequenceIndex,
        /// The item that was skipped.
        item: Item,
        /// Why its asset was unusable.
        reason: AssetError,
    },

    /// Every item of the page has been drained.
    BatchSettled {
        /// Page whose items are all drained.
        page: PageNumber,
    },

    /// Advisory: the page request failed. Pagination is idle again and a
    /// later scroll retries the same page.
    FetchFailed {
        /// Page that failed.
        page: PageNumber,
        /// What went wrong.
        error: FetchError,
    },

    /// The data source returned an empty page; no more pages will be
    /// requested.
    FeedExhausted {
        /// Page that came back empty.
        page: PageNumber,
    },

    /// Geometry changed and all placed items are being laid out again.
    /// Followed by one `Repositioned` per placed item, in sequence order.
    Relayout {
        /// Column width under the new geometry.
        column_width: f64,
    },

    /// New position of an already-placed item after a relayout.
    Repositioned {
        /// Position under the new geometry.
        placement: Placement,
    },
}

impl LayoutEvent {
    /// Sequence index the event refers to, if any.
    pub fn sequence(&self) -> Option<SequenceIndex> {
        match self {
            LayoutEvent::Placed { placement, .. } | LayoutEvent::Repositioned { placement } => {
                Some(placement.sequence)
            }
            LayoutEvent::Skipped { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

/// Consumer of layout events (terminal board, DOM bridge, test recorder).
///
/// A sink must not expect to call back into the session while handling an
/// event. Work it triggers (e.g. further asset completions) goes through a
/// `CompletionSender` and is processed after the current dispatch finishes.
pub trait RenderSink {
    /// Called once per event, in emission order.
    fn handle(&mut self, event: &LayoutEvent);
}

/// Recording sink, handy for tests and headless replays.
impl RenderSink for Vec<LayoutEvent> {
    fn handle(&mut self, event: &LayoutEvent) {
        self.push(event.clone());
    }
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn handle(&mut self, _event: &LayoutEvent) {}
}
