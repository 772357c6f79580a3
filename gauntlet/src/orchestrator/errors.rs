//! Orchestrator error types.

use thiserror::Error;

use super::config::ConfigError;
use super::models::TournamentId;
use crate::bracket::BracketError;
use crate::external::EscrowError;
use crate::queue::{AccountId, Amount, ParticipantId, QueueError};
use crate::rewards::RewardTableError;
use crate::selection::SelectionError;

/// Gauntlet errors
#[derive(Debug, Error)]
pub enum GauntletError {
    #[error("game is disabled")]
    GameDisabled,

    #[error("incorrect fee: expected {expected}, paid {paid}")]
    IncorrectFee { expected: Amount, paid: Amount },

    #[error("participant {participant_id} is not controlled by account {caller}")]
    NotOwned {
        participant_id: ParticipantId,
        caller: AccountId,
    },

    #[error("participant {0} is not eligible")]
    NotEligible(ParticipantId),

    #[error("participant {0} is already queued")]
    AlreadyQueued(ParticipantId),

    #[error("participant {participant_id} is in tournament {tournament_id}")]
    AlreadyInTournament {
        participant_id: ParticipantId,
        tournament_id: TournamentId,
    },

    #[error("participant {0} is not in the queue")]
    NotInQueue(ParticipantId),

    #[error("queue is frozen while tournament {0} selects entrants")]
    QueueFrozen(TournamentId),

    #[error("invalid tournament size: {0}")]
    InvalidSize(usize),

    #[error("queue must be empty, has {0} participants")]
    QueueNotEmpty(usize),

    #[error("tournament {0} is pending")]
    TournamentPending(TournamentId),

    #[error("invalid fee rate: {0} bps")]
    InvalidFeeRate(u16),

    #[error("account {0} is not the operator")]
    Unauthorized(AccountId),

    #[error("no fees to withdraw")]
    NoFeesToWithdraw,

    #[error("timeout not reached for tournament {0}")]
    TimeoutNotReached(TournamentId),

    #[error("randomness for tournament {0} is available; advance it instead")]
    RandomnessAvailable(TournamentId),

    #[error("no gauntlet is pending")]
    GauntletNotPending,

    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("bracket error: {0}")]
    Bracket(#[from] BracketError),

    #[error("invalid reward table: {0}")]
    InvalidRewardTable(#[from] RewardTableError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GauntletError {
    /// Get a client-safe error message that doesn't leak account details
    pub fn client_message(&self) -> String {
        match self {
            GauntletError::NotOwned { .. } => "Participant not owned by caller".to_string(),
            GauntletError::Unauthorized(_) => "Unauthorized".to_string(),
            GauntletError::Escrow(_) => "Payment failed".to_string(),
            GauntletError::Queue(QueueError::Inconsistent(_)) => {
                "Internal error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for gauntlet operations
pub type GauntletResult<T> = Result<T, GauntletError>;
