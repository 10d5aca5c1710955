//! PendingBuffer - per-item completion state, indexed by sequence index.
//!
//! Slots are appended Unresolved when a batch is allocated and move exactly
//! once to a terminal state when the asset loader reports back. A slot never
//! reverts.

use crate::model::{AssetError, Extent, Item, LoadOutcome, ResolveError, SequenceIndex};
use std::ops::Range;

/// Completion state of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    /// Asset still loading.
    Unresolved,
    /// Asset produced a usable size.
    ResolvedOk(Extent),
    /// Asset failed; the slot is consumed without occupying layout space.
    ResolvedFail(AssetError),
}

impl SlotState {
    /// True once the slot resolved either way.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SlotState::Unresolved)
    }
}

/// One item awaiting (or past) resolution.
///
/// The item itself is moved out when the sequencer drains the slot, so
/// drained slots only retain their state.
#[derive(Debug, Clone)]
pub struct PendingSlot {
    item: Option<Item>,
    state: SlotState,
}

impl PendingSlot {
    /// Resolution state.
    pub fn state(&self) -> &SlotState {
        &self.state
    }

    /// The item, until it has been drained.
    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }
}

/// Append-only buffer of pending slots for a whole session.
#[derive(Debug, Clone, Default)]
pub struct PendingBuffer {
    slots: Vec<PendingSlot>,
}

impl PendingBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence index the next allocated item must carry.
    pub fn next_sequence(&self) -> SequenceIndex {
        SequenceIndex::new(self.slots.len())
    }

    /// Appends one Unresolved slot per item.
    ///
    /// Items must carry consecutive sequence indices starting at
    /// `next_sequence()`. Returns the raw index range that was allocated.
    pub fn allocate(&mut self, items: Vec<Item>) -> Range<usize> {
        let start = self.slots.len();
        for (offset, item) in items.into_iter().enumerate() {
            debug_assert_eq!(
                item.sequence().get(),
                start + offset,
                "items must be allocated in sequence order"
            );
            self.slots.push(PendingSlot {
                item: Some(item),
                state: SlotState::Unresolved,
            });
        }
        start..self.slots.len()
    }

    /// Moves a slot from Unresolved to a terminal state.
    ///
    /// Outcomes with unusable dimensions are stored as failures.
    ///
    /// # Errors
    ///
    /// - `UnknownSlot` if no slot was allocated at `index`
    /// - `DoubleResolve` if the slot is already terminal (left unchanged)
    pub fn resolve(
        &mut self,
        index: SequenceIndex,
        outcome: LoadOutcome,
    ) -> Result<&SlotState, ResolveError> {
        let allocated = self.slots.len();
        let slot = self
            .slots
            .get_mut(index.get())
            .ok_or(ResolveError::UnknownSlot { index, allocated })?;

        if slot.state.is_terminal() {
            return Err(ResolveError::DoubleResolve { index });
        }

        slot.state = match outcome.into_extent() {
            Ok(extent) => SlotState::ResolvedOk(extent),
            Err(reason) => SlotState::ResolvedFail(reason),
        };
        Ok(&slot.state)
    }

    /// State of a slot, `None` past the end of allocated items.
    pub fn peek(&self, index: SequenceIndex) -> Option<&SlotState> {
        self.slots.get(index.get()).map(|s| &s.state)
    }

    /// Full slot at `index`.
    pub fn slot(&self, index: SequenceIndex) -> Option<&PendingSlot> {
        self.slots.get(index.get())
    }

    /// Moves the item out of its slot (used once, when the slot is drained).
    pub fn take_item(&mut self, index: SequenceIndex) -> Option<Item> {
        self.slots.get_mut(index.get()).and_then(|s| s.item.take())
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True before the first allocation.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots still waiting on their asset.
    pub fn unresolved_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !s.state.is_terminal())
            .count()
    }
}
