//! Arena-backed participant queue with O(1) swap-and-pop removal.

use log::debug;
use std::collections::HashMap;

use super::{
    errors::{QueueError, QueueResult},
    models::{Amount, ParticipantId, ParticipantSlot},
};

/// Ordered, randomly-removable sequence of slots plus an inverse index.
///
/// Invariant: `positions[p] == i` iff `slots[i].participant_id == p`, and
/// `fee_pool == sum(slots[i].fee_paid)`. Order is not preserved by removal.
#[derive(Debug, Default, Clone)]
pub struct ParticipantQueue {
    slots: Vec<ParticipantSlot>,
    positions: HashMap<ParticipantId, usize>,
    fee_pool: Amount,
}

impl ParticipantQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            fee_pool: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of the fees recorded on every queued slot.
    #[must_use]
    pub fn fee_pool(&self) -> Amount {
        self.fee_pool
    }

    #[must_use]
    pub fn contains(&self, participant_id: ParticipantId) -> bool {
        self.positions.contains_key(&participant_id)
    }

    /// Zero-based position of a queued participant.
    #[must_use]
    pub fn position_of(&self, participant_id: ParticipantId) -> Option<usize> {
        self.positions.get(&participant_id).copied()
    }

    #[must_use]
    pub fn get(&self, participant_id: ParticipantId) -> Option<&ParticipantSlot> {
        self.position_of(participant_id).map(|i| &self.slots[i])
    }

    #[must_use]
    pub fn slots(&self) -> &[ParticipantSlot] {
        &self.slots
    }

    /// Append a slot, returning its position.
    pub fn push(&mut self, slot: ParticipantSlot) -> QueueResult<usize> {
        if self.contains(slot.participant_id) {
            return Err(QueueError::AlreadyQueued(slot.participant_id));
        }

        let fee_pool = self
            .fee_pool
            .checked_add(slot.fee_paid)
            .ok_or(QueueError::FeePoolOverflow)?;

        let position = self.slots.len();
        self.positions.insert(slot.participant_id, position);
        self.slots.push(slot);
        self.fee_pool = fee_pool;

        Ok(position)
    }

    /// Remove a participant by moving the tail slot into its position.
    pub fn swap_remove(&mut self, participant_id: ParticipantId) -> Option<ParticipantSlot> {
        let position = self.position_of(participant_id)?;
        Some(self.remove_at(position))
    }

    /// Remove the slots at `positions` in one combined pass.
    ///
    /// Removal runs from the highest position down, so every tail slot that
    /// gets moved is one that stays queued. Slots are returned in the order
    /// the positions were given. Out-of-range or repeated positions are
    /// skipped.
    pub fn take_positions(&mut self, positions: &[usize]) -> Vec<ParticipantSlot> {
        let mut order: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.slots.len())
            .collect();
        order.sort_unstable_by(|a, b| b.cmp(a));
        order.dedup();

        let mut taken = HashMap::with_capacity(order.len());
        for position in order {
            taken.insert(position, self.remove_at(position));
        }

        positions.iter().filter_map(|p| taken.remove(p)).collect()
    }

    /// Remove every slot, returning them in queue order.
    pub fn drain(&mut self) -> Vec<ParticipantSlot> {
        self.positions.clear();
        self.fee_pool = 0;
        std::mem::take(&mut self.slots)
    }

    /// Verify the inverse index and fee pool against the slot sequence.
    pub fn check_consistency(&self) -> QueueResult<()> {
        if self.positions.len() != self.slots.len() {
            return Err(QueueError::Inconsistent(format!(
                "{} index entries for {} slots",
                self.positions.len(),
                self.slots.len()
            )));
        }

        let mut fees: Amount = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            if self.positions.get(&slot.participant_id) != Some(&i) {
                return Err(QueueError::Inconsistent(format!(
                    "participant {} at position {i} is indexed at {:?}",
                    slot.participant_id,
                    self.positions.get(&slot.participant_id)
                )));
            }
            fees = fees
                .checked_add(slot.fee_paid)
                .ok_or(QueueError::FeePoolOverflow)?;
        }

        if fees != self.fee_pool {
            return Err(QueueError::Inconsistent(format!(
                "fee pool {} but slots sum to {fees}",
                self.fee_pool
            )));
        }

        Ok(())
    }

    fn remove_at(&mut self, position: usize) -> ParticipantSlot {
        let removed = self.slots.swap_remove(position);
        self.positions.remove(&removed.participant_id);

        if let Some(moved) = self.slots.get(position) {
            self.positions.insert(moved.participant_id, position);
            debug!(
                "queue: participant {} moved from {} to {position}",
                moved.participant_id,
                self.slots.len()
            );
        }

        self.fee_pool -= removed.fee_paid;
        removed
    }
}
