//! Queue data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Participant ID type
pub type ParticipantId = u64;

/// Account (controller/payer) ID type
pub type AccountId = u64;

/// Monetary amount in the escrow's smallest unit
pub type Amount = u64;

/// Opaque reference to a participant's equipment, consumed by the fight resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadoutRef(pub u32);

/// One queued participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSlot {
    pub participant_id: ParticipantId,
    pub loadout: LoadoutRef,
    /// Account that paid the fee; every refund goes back to it.
    pub owner: AccountId,
    /// Fee paid at enqueue time. Survives later fee changes.
    pub fee_paid: Amount,
    /// Enqueue sequence number, unique for the life of the orchestrator.
    pub ticket: u64,
    pub enqueued_at: DateTime<Utc>,
}
