//! Contracts for the collaborators the orchestrator consumes.
//!
//! The orchestrator owns no money, identity or combat logic. It talks to:
//! - [`Clock`]: wall time for interval and timeout gates
//! - [`EligibilityRegistry`]: who controls a participant and whether it may fight
//! - [`Escrow`]: custody of entry fees, refunds and prize payouts
//! - [`FightResolver`]: the winner of a single match
//! - [`RewardLedger`]: experience/ticket credits and win/loss records
//!
//! The randomness beacon lives in [`crate::randomness`]. Thread-safe
//! in-memory implementations of every contract are in [`memory`].

pub mod errors;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use errors::{EscrowError, EscrowResult};

use crate::bracket::{Contestant, FightOutcome, MatchResult};
use crate::queue::{AccountId, Amount, ParticipantId};
use crate::randomness::Entropy;
use crate::rewards::Reward;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Identity and eligibility of participants.
pub trait EligibilityRegistry: Send + Sync {
    /// False once a participant is retired or otherwise invalidated.
    fn is_eligible(&self, participant_id: ParticipantId) -> bool;

    /// Current controller of a participant, if it exists.
    fn owner_of(&self, participant_id: ParticipantId) -> Option<AccountId>;
}

/// Outcome of an idempotency-keyed escrow call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receipt {
    /// The transfer happened now.
    Applied,
    /// The key was already used; nothing moved this time.
    Replayed,
}

/// Custody of funds.
///
/// Every call carries an idempotency key. Repeating a call with a key that
/// was already applied must return [`Receipt::Replayed`] without moving
/// funds, so a retried refund can never be paid twice.
pub trait Escrow: Send + Sync {
    /// Move `amount` from `from` into custody.
    fn collect(&self, from: AccountId, amount: Amount, key: &str) -> EscrowResult<Receipt>;

    /// Return `amount` from custody to `to`.
    fn refund(&self, to: AccountId, amount: Amount, key: &str) -> EscrowResult<Receipt>;

    /// Pay `amount` from custody to `to` as a prize or fee withdrawal.
    fn payout(&self, to: AccountId, amount: Amount, key: &str) -> EscrowResult<Receipt>;
}

/// Decides a single match. Must be a pure function of its inputs.
pub trait FightResolver: Send + Sync {
    fn resolve(&self, a: &Contestant, b: &Contestant, seed: &Entropy) -> FightOutcome;
}

/// Non-monetary rewards and match history.
pub trait RewardLedger: Send + Sync {
    fn credit(&self, participant_id: ParticipantId, reward: Reward);

    fn record_result(&self, participant_id: ParticipantId, result: MatchResult);
}
