//! Sequencing layer - reconciling ordered placement with unordered loading.
//!
//! - `pending_buffer`: PendingBuffer - per-item completion state
//! - `drain`: Sequencer - cursor, drain loop, batch settlement
//! - `events`: LayoutEvent and RenderSink

pub mod drain;
pub mod events;
pub mod pending_buffer;

pub use drain::{Batch, DrainSummary, Sequencer, SequencerState};
pub use events::{LayoutEvent, NullSink, RenderSink};
pub use pending_buffer::{PendingBuffer, PendingSlot, SlotState};
