//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bracket::{Entrant, SubstitutionPolicy};
use crate::queue::{AccountId, Amount, LoadoutRef, ParticipantId, ParticipantSlot};
use crate::randomness::RandomnessCommitment;
use crate::rewards::{FeeRate, FeeSplit, Reward};

/// Tournament ID type
pub type TournamentId = u64;

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentState {
    /// Committed and waiting on randomness
    Pending,
    /// Bracket ran and accounts were settled
    Completed,
    /// Cancelled by timeout recovery, entrants refunded
    Recovered,
}

/// Progress of a pending tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentPhase {
    /// Selection anchor bound, queue untouched
    Committed,
    /// Entrants drawn, execution anchor bound
    Selected,
    /// Bracket ran
    Executed,
    /// Recovery started refunding; only recovery may continue
    Recovering,
}

/// A selected entrant with everything needed to refund or pay them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedEntry {
    pub participant_id: ParticipantId,
    pub loadout: LoadoutRef,
    /// Account that paid the fee.
    pub payer: AccountId,
    pub fee_paid: Amount,
    pub ticket: u64,
    /// Set once recovery has returned the fee.
    #[serde(default)]
    pub refunded: bool,
}

impl From<ParticipantSlot> for SelectedEntry {
    fn from(slot: ParticipantSlot) -> Self {
        Self {
            participant_id: slot.participant_id,
            loadout: slot.loadout,
            payer: slot.owner,
            fee_paid: slot.fee_paid,
            ticket: slot.ticket,
            refunded: false,
        }
    }
}

/// Final standing of a real participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub participant_id: ParticipantId,
    /// 0 for the champion, 1 for the runner-up, larger for earlier exits.
    pub tier: u32,
    pub reward: Reward,
}

/// One run of the bracket. Kept in history after it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub size: usize,
    pub entry_fee_snapshot: Amount,
    pub fee_rate_snapshot: FeeRate,
    pub policy_snapshot: SubstitutionPolicy,
    pub state: TournamentState,
    pub phase: TournamentPhase,
    pub selection: RandomnessCommitment,
    pub execution: Option<RandomnessCommitment>,
    /// Entrants in seeding order.
    pub participants: Vec<SelectedEntry>,
    pub champion: Option<Entrant>,
    pub runner_up: Option<Entrant>,
    pub fee_split: Option<FeeSplit>,
    pub prize_paid: Amount,
    pub placements: Vec<Placement>,
    pub substituted: Vec<ParticipantId>,
    pub committed_at: DateTime<Utc>,
    /// Time of the latest randomness request; the recovery timeout runs from here.
    pub last_request_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == TournamentState::Pending
    }

    /// Entry fees still held for the selected entrants.
    #[must_use]
    pub fn locked_funds(&self) -> Amount {
        self.participants
            .iter()
            .filter(|p| !p.refunded)
            .map(|p| p.fee_paid)
            .sum()
    }

    #[must_use]
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.participant_id).collect()
    }
}

/// Where a participant currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    #[default]
    Idle,
    Queued,
    InTournament(TournamentId),
}

/// Why a tick did not advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitReason {
    Disabled,
    QueueTooShort { queued: usize, needed: usize },
    IntervalNotElapsed { ready_at: DateTime<Utc> },
    SelectionPending,
    ExecutionPending,
    /// The anchor can no longer be read; only recovery can move on.
    AnchorExpired,
    /// A recovery stopped partway; call `recover` again to finish it.
    Recovering,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    Committed(TournamentId),
    Selected(TournamentId),
    Completed(TournamentId),
    Waiting(WaitReason),
}

impl TickOutcome {
    #[must_use]
    pub fn advanced(&self) -> bool {
        !matches!(self, Self::Waiting(_))
    }
}
