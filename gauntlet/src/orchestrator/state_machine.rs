//! Phase state machine: commit, select, execute, and timeout recovery.
//!
//! ```text
//! Idle --tick--> Committed --tick--> Selected --tick--> Completed (Idle again)
//!                    \                   /
//!                     `---- recover ----'--> Recovered (Idle again)
//! ```
//!
//! Every step is driven by [`Gauntlet::tick`], which advances at most one
//! phase and otherwise reports why it is waiting. Nothing in here blocks.
//! Once [`Gauntlet::recover`] has started refunding, the tournament stays in
//! `Recovering` until a later `recover` call finishes it.

use log::{error, info, warn};

use super::{
    errors::{GauntletError, GauntletResult},
    events::GauntletEvent,
    manager::Gauntlet,
    models::{
        ParticipantStatus, Placement, SelectedEntry, TickOutcome, Tournament, TournamentId, TournamentPhase,
        TournamentState, WaitReason,
    },
};
use crate::bracket::{BracketExecutor, Contestant, Entrant, MatchResult};
use crate::queue::Amount;
use crate::randomness::{Entropy, RandomnessCommitment, Reveal};
use crate::rewards::{FeeSplit, PayoutPlan, PrizeRecipient};
use crate::selection::ParticipantSelector;

impl Gauntlet {
    /// Advance the pending tournament by one phase, or start a new one.
    ///
    /// Returns [`TickOutcome::Waiting`] when the next step's precondition does
    /// not hold yet; that is safe to poll. Errors only come from collaborator
    /// failures, and leave the state exactly as it was.
    pub fn tick(&mut self) -> GauntletResult<TickOutcome> {
        let pending = self.pending_tournament().map(|t| (t.id, t.phase));

        match pending {
            None => Ok(self.try_commit()),
            Some((id, TournamentPhase::Committed)) => self.try_select(id),
            Some((id, TournamentPhase::Selected)) => self.try_execute(id),
            Some((_, TournamentPhase::Recovering)) => {
                Ok(TickOutcome::Waiting(WaitReason::Recovering))
            }
            Some((id, TournamentPhase::Executed)) => {
                error!("gauntlet: tournament {id} is executed but still pending");
                Ok(TickOutcome::Waiting(WaitReason::ExecutionPending))
            }
        }
    }

    /// Cancel the pending tournament after its randomness failed to arrive.
    ///
    /// Anyone may call this once `timeout_secs` have passed since the last
    /// randomness request. Selected entrants get their recorded fee back; a
    /// tournament that never selected anyone has nothing to refund.
    ///
    /// The tournament enters `Recovering` before the first refund. If a
    /// refund fails, the ones already made stay marked and the tournament can
    /// neither execute nor select; calling this again finishes the rest.
    pub fn recover(&mut self) -> GauntletResult<TournamentId> {
        let id = self.pending.ok_or(GauntletError::GauntletNotPending)?;
        let tournament = self
            .tournament(id)
            .ok_or(GauntletError::TournamentNotFound(id))?;
        if !tournament.is_pending() {
            return Err(GauntletError::GauntletNotPending);
        }

        let now = self.services.clock.now();
        if tournament.phase != TournamentPhase::Recovering {
            if now < tournament.last_request_at + self.config.timeout_window() {
                return Err(GauntletError::TimeoutNotReached(id));
            }

            // A readable anchor means the tournament can still advance; cancelling
            // it then would let an entrant opt out after seeing the outcome.
            let current = match tournament.phase {
                TournamentPhase::Committed => Some(tournament.selection),
                _ => tournament.execution,
            };
            if let Some(commitment) = current {
                if let Reveal::Available(_) = commitment.read(self.services.beacon.as_ref()) {
                    return Err(GauntletError::RandomnessAvailable(id));
                }
            }

            self.tournament_mut(id)?.phase = TournamentPhase::Recovering;
        }

        self.refund_entrants(id)?;

        let tournament = self.tournament_mut(id)?;
        let refunded: Amount = tournament.participants.iter().map(|e| e.fee_paid).sum();
        let participants = tournament.participant_ids();
        tournament.state = TournamentState::Recovered;
        tournament.completed_at = Some(now);
        for participant_id in &participants {
            self.statuses.remove(participant_id);
        }
        self.pending = None;

        warn!(
            "gauntlet: tournament {id} recovered, {} entrants refunded {refunded}",
            participants.len()
        );
        self.events.push_back(GauntletEvent::TournamentRecovered {
            tournament_id: id,
            refunded,
        });

        Ok(id)
    }

    fn try_commit(&mut self) -> TickOutcome {
        if !self.config.enabled {
            return TickOutcome::Waiting(WaitReason::Disabled);
        }

        let needed = self.config.tournament_size;
        if self.queue.len() < needed {
            return TickOutcome::Waiting(WaitReason::QueueTooShort {
                queued: self.queue.len(),
                needed,
            });
        }

        let now = self.services.clock.now();
        if let Some(last_start) = self.last_start {
            let ready_at = last_start + self.config.min_interval();
            if now < ready_at {
                return TickOutcome::Waiting(WaitReason::IntervalNotElapsed { ready_at });
            }
        }

        let id = self.tournaments.len() as TournamentId + 1;
        let selection = RandomnessCommitment::request(self.services.beacon.as_ref(), id, now);

        self.tournaments.push(Tournament {
            id,
            size: needed,
            entry_fee_snapshot: self.config.entry_fee,
            fee_rate_snapshot: self.config.fee_rate,
            policy_snapshot: self.config.substitution_policy,
            state: TournamentState::Pending,
            phase: TournamentPhase::Committed,
            selection,
            execution: None,
            participants: Vec::with_capacity(needed),
            champion: None,
            runner_up: None,
            fee_split: None,
            prize_paid: 0,
            placements: Vec::new(),
            substituted: Vec::new(),
            committed_at: now,
            last_request_at: now,
            completed_at: None,
        });
        self.pending = Some(id);
        self.last_start = Some(now);

        info!(
            "gauntlet: tournament {id} committed for {needed} at anchor {}",
            selection.anchor
        );
        self.events.push_back(GauntletEvent::TournamentCommitted {
            tournament_id: id,
            size: needed,
            anchor: selection.anchor,
        });

        TickOutcome::Committed(id)
    }

    fn try_select(&mut self, id: TournamentId) -> GauntletResult<TickOutcome> {
        let tournament = self
            .tournament(id)
            .ok_or(GauntletError::TournamentNotFound(id))?;
        let entropy = match self.read_anchor(&tournament.selection) {
            Ok(entropy) => entropy,
            Err(reason) => return Ok(TickOutcome::Waiting(reason)),
        };

        let size = tournament.size;
        if self.queue.len() < size {
            // Withdrawals before the reveal can leave the queue short; the
            // anchor then expires and recovery releases the tournament.
            return Ok(TickOutcome::Waiting(WaitReason::QueueTooShort {
                queued: self.queue.len(),
                needed: size,
            }));
        }

        let positions = ParticipantSelector::new(entropy).select(self.queue.len(), size)?;
        let now = self.services.clock.now();
        let execution = RandomnessCommitment::request(self.services.beacon.as_ref(), id, now);

        let entries: Vec<SelectedEntry> = self
            .queue
            .take_positions(&positions)
            .into_iter()
            .map(SelectedEntry::from)
            .collect();
        for entry in &entries {
            self.statuses
                .insert(entry.participant_id, ParticipantStatus::InTournament(id));
        }
        let participants: Vec<_> = entries.iter().map(|e| e.participant_id).collect();

        let tournament = self.tournament_mut(id)?;
        tournament.participants = entries;
        tournament.execution = Some(execution);
        tournament.phase = TournamentPhase::Selected;
        tournament.last_request_at = now;

        info!(
            "gauntlet: tournament {id} selected {participants:?}, execution anchor {}",
            execution.anchor
        );
        self.events.push_back(GauntletEvent::ParticipantsSelected {
            tournament_id: id,
            participants,
            anchor: execution.anchor,
        });

        Ok(TickOutcome::Selected(id))
    }

    fn try_execute(&mut self, id: TournamentId) -> GauntletResult<TickOutcome> {
        let tournament = self
            .tournament(id)
            .ok_or(GauntletError::TournamentNotFound(id))?;
        let Some(execution) = tournament.execution else {
            error!("gauntlet: tournament {id} selected without an execution anchor");
            return Ok(TickOutcome::Waiting(WaitReason::ExecutionPending));
        };
        let entropy = match self.read_anchor(&execution) {
            Ok(entropy) => entropy,
            Err(WaitReason::SelectionPending) => {
                return Ok(TickOutcome::Waiting(WaitReason::ExecutionPending));
            }
            Err(reason) => return Ok(TickOutcome::Waiting(reason)),
        };

        // Compute everything before the first external effect.
        let seeding: Vec<Contestant> = tournament
            .participants
            .iter()
            .map(|p| Contestant::real(p.participant_id, p.loadout))
            .collect();
        let outcome = BracketExecutor::new(
            self.services.resolver.as_ref(),
            self.services.registry.as_ref(),
            tournament.policy_snapshot,
            self.config.fallback_loadout,
        )
        .run(&seeding, &entropy)?;

        let split = FeeSplit::compute(tournament.locked_funds(), tournament.fee_rate_snapshot);
        let recipient = match outcome.champion {
            Entrant::Real(participant_id) => self
                .services
                .registry
                .owner_of(participant_id)
                .map_or(PrizeRecipient::House, PrizeRecipient::Controller),
            Entrant::Fallback => PrizeRecipient::House,
        };
        let plan = PayoutPlan::new(split, recipient);
        let accumulated_fees = self
            .accumulated_fees
            .checked_add(plan.fees_accrued)
            .ok_or(GauntletError::ArithmeticOverflow)?;

        let size = tournament.size;
        let placements: Vec<Placement> = outcome
            .placements()
            .into_iter()
            .map(|(participant_id, tier)| Placement {
                participant_id,
                tier,
                reward: self.config.rewards.reward_for(size, tier),
            })
            .collect();
        let participants = tournament.participant_ids();

        if let PrizeRecipient::Controller(account) = plan.recipient {
            if plan.prize_paid() > 0 {
                self.services
                    .escrow
                    .payout(account, plan.prize_paid(), &format!("prize:{id}"))?;
            }
        }

        for record in outcome.matches.iter().filter(|m| m.was_fought()) {
            for (entrant, result) in [
                (record.winner, MatchResult::Win),
                (record.loser, MatchResult::Loss),
            ] {
                if let Entrant::Real(participant_id) = entrant {
                    self.services.ledger.record_result(participant_id, result);
                }
            }
        }
        for placement in placements.iter().filter(|p| !p.reward.is_zero()) {
            self.services
                .ledger
                .credit(placement.participant_id, placement.reward);
        }

        for participant_id in &participants {
            self.statuses.remove(participant_id);
        }

        if !outcome.substituted.is_empty() {
            warn!(
                "gauntlet: tournament {id} substituted {:?}",
                outcome.substituted
            );
        }

        let now = self.services.clock.now();
        let tournament = self.tournament_mut(id)?;
        tournament.state = TournamentState::Completed;
        tournament.phase = TournamentPhase::Executed;
        tournament.champion = Some(outcome.champion);
        tournament.runner_up = Some(outcome.runner_up);
        tournament.fee_split = Some(split);
        tournament.prize_paid = plan.prize_paid();
        tournament.placements = placements;
        tournament.substituted = outcome.substituted;
        tournament.completed_at = Some(now);
        self.accumulated_fees = accumulated_fees;
        self.pending = None;

        info!(
            "gauntlet: tournament {id} won by {}, runner-up {}, prize {}",
            outcome.champion,
            outcome.runner_up,
            plan.prize_paid()
        );
        self.events.push_back(GauntletEvent::TournamentCompleted {
            tournament_id: id,
            champion: outcome.champion,
            runner_up: outcome.runner_up,
            prize: plan.prize_paid(),
            platform_fee: plan.fees_accrued,
        });

        Ok(TickOutcome::Completed(id))
    }

    /// Refund every entrant not yet marked, marking each one as it succeeds.
    fn refund_entrants(&mut self, id: TournamentId) -> GauntletResult<()> {
        let outstanding: Vec<(usize, SelectedEntry)> = self
            .tournament(id)
            .ok_or(GauntletError::TournamentNotFound(id))?
            .participants
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.refunded)
            .map(|(i, entry)| (i, entry.clone()))
            .collect();

        for (index, entry) in outstanding {
            if let Err(err) = self.refund_slot(entry.payer, entry.fee_paid, entry.ticket) {
                warn!("gauntlet: tournament {id} recovery stopped at entrant {index}: {err}");
                return Err(err);
            }
            self.tournament_mut(id)?.participants[index].refunded = true;
        }
        Ok(())
    }

    fn read_anchor(&self, commitment: &RandomnessCommitment) -> Result<Entropy, WaitReason> {
        match commitment.read(self.services.beacon.as_ref()) {
            Reveal::Available(entropy) => Ok(entropy),
            Reveal::Pending => Err(WaitReason::SelectionPending),
            Reveal::Expired => {
                warn!(
                    "gauntlet: anchor {} for tournament {} expired",
                    commitment.anchor, commitment.tournament_id
                );
                Err(WaitReason::AnchorExpired)
            }
        }
    }

    fn tournament_mut(&mut self, id: TournamentId) -> GauntletResult<&mut Tournament> {
        let index = usize::try_from(id)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .ok_or(GauntletError::TournamentNotFound(id))?;
        self.tournaments
            .get_mut(index)
            .ok_or(GauntletError::TournamentNotFound(id))
    }
}
