//! Participant queue with per-slot fee bookkeeping.

pub mod arena;
pub mod errors;
pub mod models;

pub use arena::ParticipantQueue;
pub use errors::{QueueError, QueueResult};
pub use models::{AccountId, Amount, LoadoutRef, ParticipantId, ParticipantSlot};
