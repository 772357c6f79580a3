//! Events emitted for external indexers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::models::TournamentId;
use crate::bracket::{Entrant, SubstitutionPolicy};
use crate::queue::{AccountId, Amount, ParticipantId};
use crate::randomness::Anchor;
use crate::rewards::FeeRate;

/// Everything observable that the orchestrator does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GauntletEvent {
    ParticipantQueued {
        participant_id: ParticipantId,
        queue_size: usize,
        fee: Amount,
    },
    ParticipantWithdrew {
        participant_id: ParticipantId,
        queue_size: usize,
        refunded: Amount,
    },
    QueueCleared {
        count: usize,
        refunded: Amount,
    },
    TournamentCommitted {
        tournament_id: TournamentId,
        size: usize,
        anchor: Anchor,
    },
    ParticipantsSelected {
        tournament_id: TournamentId,
        participants: Vec<ParticipantId>,
        anchor: Anchor,
    },
    TournamentCompleted {
        tournament_id: TournamentId,
        champion: Entrant,
        runner_up: Entrant,
        prize: Amount,
        platform_fee: Amount,
    },
    TournamentRecovered {
        tournament_id: TournamentId,
        refunded: Amount,
    },
    EntryFeeChanged {
        old: Amount,
        new: Amount,
    },
    TournamentSizeChanged {
        old: usize,
        new: usize,
    },
    FeeRateChanged {
        old: FeeRate,
        new: FeeRate,
    },
    SubstitutionPolicyChanged {
        policy: SubstitutionPolicy,
    },
    MinIntervalChanged {
        secs: u32,
    },
    RewardTableChanged {
        size: usize,
        tiers: usize,
    },
    GameToggled {
        enabled: bool,
    },
    FeesWithdrawn {
        to: AccountId,
        amount: Amount,
    },
}

impl fmt::Display for GauntletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::ParticipantQueued {
                participant_id,
                queue_size,
                fee,
            } => format!("participant {participant_id} queued for {fee} ({queue_size} waiting)"),
            Self::ParticipantWithdrew {
                participant_id,
                refunded,
                ..
            } => format!("participant {participant_id} withdrew, refunded {refunded}"),
            Self::QueueCleared { count, refunded } => {
                format!("queue cleared: {count} removed, {refunded} refunded")
            }
            Self::TournamentCommitted {
                tournament_id,
                size,
                anchor,
            } => format!("tournament {tournament_id} committed for {size} at anchor {anchor}"),
            Self::ParticipantsSelected {
                tournament_id,
                participants,
                ..
            } => format!(
                "tournament {tournament_id} selected {} participants",
                participants.len()
            ),
            Self::TournamentCompleted {
                tournament_id,
                champion,
                prize,
                ..
            } => format!("tournament {tournament_id} won by {champion}, prize {prize}"),
            Self::TournamentRecovered {
                tournament_id,
                refunded,
            } => format!("tournament {tournament_id} recovered, {refunded} refunded"),
            Self::EntryFeeChanged { old, new } => format!("entry fee {old} -> {new}"),
            Self::TournamentSizeChanged { old, new } => format!("tournament size {old} -> {new}"),
            Self::FeeRateChanged { old, new } => format!("fee rate {old} -> {new}"),
            Self::SubstitutionPolicyChanged { policy } => {
                format!("substitution policy set to {policy}")
            }
            Self::MinIntervalChanged { secs } => format!("minimum interval set to {secs}s"),
            Self::RewardTableChanged { size, tiers } => {
                format!("reward table for {size} set with {tiers} tiers")
            }
            Self::GameToggled { enabled } => {
                if *enabled {
                    "game enabled".to_string()
                } else {
                    "game disabled".to_string()
                }
            }
            Self::FeesWithdrawn { to, amount } => format!("{amount} fees withdrawn to {to}"),
        };
        write!(f, "{repr}")
    }
}
