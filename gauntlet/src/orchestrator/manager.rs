//! Orchestrator state, queue entry points and administration.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use super::{
    config::GauntletConfig,
    errors::{GauntletError, GauntletResult},
    events::GauntletEvent,
    models::{ParticipantStatus, Tournament, TournamentId, TournamentPhase},
};
use crate::bracket::{SubstitutionPolicy, is_supported_size};
use crate::external::{Clock, EligibilityRegistry, Escrow, FightResolver, RewardLedger};
use crate::queue::{
    AccountId, Amount, LoadoutRef, ParticipantId, ParticipantQueue, ParticipantSlot,
};
use crate::randomness::{RandomnessBeacon, Reveal};
use crate::rewards::{FeeRate, Reward, RewardTable};

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub beacon: Arc<dyn RandomnessBeacon>,
    pub registry: Arc<dyn EligibilityRegistry>,
    pub escrow: Arc<dyn Escrow>,
    pub resolver: Arc<dyn FightResolver>,
    pub ledger: Arc<dyn RewardLedger>,
}

/// The bracket orchestrator.
///
/// Owns the queue, the tournament history and the accumulated platform fees.
/// All mutation goes through `&mut self` entry points; each either succeeds
/// completely or returns an error with the state untouched. The exceptions
/// are queue clearing and recovery, which make one refund per entrant: each
/// refund that went through is recorded before the error returns, and a
/// retry picks up the rest.
pub struct Gauntlet {
    pub(super) config: GauntletConfig,
    pub(super) services: Collaborators,
    pub(super) queue: ParticipantQueue,
    /// Participants that are not idle.
    pub(super) statuses: HashMap<ParticipantId, ParticipantStatus>,
    /// Every tournament ever committed; `id - 1` is the index.
    pub(super) tournaments: Vec<Tournament>,
    pub(super) pending: Option<TournamentId>,
    pub(super) last_start: Option<DateTime<Utc>>,
    pub(super) accumulated_fees: Amount,
    next_ticket: u64,
    fee_withdrawals: u64,
    pub(super) events: VecDeque<GauntletEvent>,
}

impl Gauntlet {
    /// Create an orchestrator after validating `config`.
    pub fn new(config: GauntletConfig, services: Collaborators) -> GauntletResult<Self> {
        config.validate()?;
        info!(
            "gauntlet: size {}, entry fee {}, fee rate {}",
            config.tournament_size, config.entry_fee, config.fee_rate
        );

        Ok(Self {
            queue: ParticipantQueue::with_capacity(config.tournament_size * 2),
            config,
            services,
            statuses: HashMap::new(),
            tournaments: Vec::new(),
            pending: None,
            last_start: None,
            accumulated_fees: 0,
            next_ticket: 1,
            fee_withdrawals: 0,
            events: VecDeque::new(),
        })
    }

    // Queue entry points

    /// Put a participant in the queue, collecting `fee_paid` from `caller`.
    pub fn enqueue(
        &mut self,
        caller: AccountId,
        participant_id: ParticipantId,
        loadout: LoadoutRef,
        fee_paid: Amount,
    ) -> GauntletResult<()> {
        if !self.config.enabled {
            return Err(GauntletError::GameDisabled);
        }
        if self.queue.contains(participant_id) {
            return Err(GauntletError::AlreadyQueued(participant_id));
        }
        if let ParticipantStatus::InTournament(tournament_id) = self.status_of(participant_id) {
            return Err(GauntletError::AlreadyInTournament {
                participant_id,
                tournament_id,
            });
        }
        if self.services.registry.owner_of(participant_id) != Some(caller) {
            return Err(GauntletError::NotOwned {
                participant_id,
                caller,
            });
        }
        if !self.services.registry.is_eligible(participant_id) {
            return Err(GauntletError::NotEligible(participant_id));
        }
        if fee_paid != self.config.entry_fee {
            return Err(GauntletError::IncorrectFee {
                expected: self.config.entry_fee,
                paid: fee_paid,
            });
        }
        self.ensure_queue_unfrozen()?;
        self.queue
            .fee_pool()
            .checked_add(fee_paid)
            .ok_or(GauntletError::ArithmeticOverflow)?;

        let ticket = self.next_ticket;
        if fee_paid > 0 {
            self.services
                .escrow
                .collect(caller, fee_paid, &format!("entry:{ticket}"))?;
        }

        self.queue.push(ParticipantSlot {
            participant_id,
            loadout,
            owner: caller,
            fee_paid,
            ticket,
            enqueued_at: self.services.clock.now(),
        })?;
        self.next_ticket += 1;
        self.statuses
            .insert(participant_id, ParticipantStatus::Queued);

        debug!(
            "gauntlet: participant {participant_id} queued at {}",
            self.queue.len() - 1
        );
        self.events.push_back(GauntletEvent::ParticipantQueued {
            participant_id,
            queue_size: self.queue.len(),
            fee: fee_paid,
        });

        Ok(())
    }

    /// Take a participant out of the queue and refund the recorded fee to
    /// the account that paid it.
    ///
    /// Only the participant's current controller may withdraw.
    pub fn withdraw(
        &mut self,
        caller: AccountId,
        participant_id: ParticipantId,
    ) -> GauntletResult<Amount> {
        let slot = self
            .queue
            .get(participant_id)
            .ok_or(GauntletError::NotInQueue(participant_id))?;
        if self.services.registry.owner_of(participant_id) != Some(caller) {
            return Err(GauntletError::NotOwned {
                participant_id,
                caller,
            });
        }
        self.ensure_queue_unfrozen()?;

        let fee = slot.fee_paid;
        self.refund_slot(slot.owner, fee, slot.ticket)?;

        self.queue.swap_remove(participant_id);
        self.statuses.remove(&participant_id);

        debug!("gauntlet: participant {participant_id} withdrew, refunded {fee}");
        self.events.push_back(GauntletEvent::ParticipantWithdrew {
            participant_id,
            queue_size: self.queue.len(),
            refunded: fee,
        });

        Ok(fee)
    }

    /// Change the entry fee, optionally clearing (and refunding) the queue.
    ///
    /// Without `clear_queue`, queued participants keep the fee they paid and
    /// only later enqueues use the new one.
    pub fn change_entry_fee(
        &mut self,
        caller: AccountId,
        new_fee: Amount,
        refund_existing: bool,
        clear_queue: bool,
    ) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        if new_fee == self.config.entry_fee {
            return Ok(());
        }

        if clear_queue {
            self.ensure_queue_unfrozen()?;
            let (count, refunded, forfeited) = if refund_existing {
                let (count, refunded) = self.refund_queue()?;
                (count, refunded, 0)
            } else {
                // Unrefunded fees stay in custody and are booked as platform fees.
                let forfeited = self.queue.fee_pool();
                self.accumulated_fees = self
                    .accumulated_fees
                    .checked_add(forfeited)
                    .ok_or(GauntletError::ArithmeticOverflow)?;

                let cleared = self.queue.drain();
                for slot in &cleared {
                    self.statuses.remove(&slot.participant_id);
                }
                (cleared.len(), 0, forfeited)
            };

            info!(
                "gauntlet: queue cleared, {count} removed, {refunded} refunded, {forfeited} forfeited"
            );
            self.events
                .push_back(GauntletEvent::QueueCleared { count, refunded });
        }

        let old = std::mem::replace(&mut self.config.entry_fee, new_fee);
        self.events
            .push_back(GauntletEvent::EntryFeeChanged { old, new: new_fee });

        Ok(())
    }

    // Administration

    pub fn set_enabled(&mut self, caller: AccountId, enabled: bool) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        if self.config.enabled != enabled {
            self.config.enabled = enabled;
            info!("gauntlet: enabled = {enabled}");
            self.events.push_back(GauntletEvent::GameToggled { enabled });
        }
        Ok(())
    }

    /// Change the bracket size. Only allowed with an empty queue and nothing pending.
    pub fn set_tournament_size(&mut self, caller: AccountId, size: usize) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        if !is_supported_size(size) {
            return Err(GauntletError::InvalidSize(size));
        }
        if !self.queue.is_empty() {
            return Err(GauntletError::QueueNotEmpty(self.queue.len()));
        }
        if let Some(id) = self.pending {
            return Err(GauntletError::TournamentPending(id));
        }

        let old = std::mem::replace(&mut self.config.tournament_size, size);
        if old != size {
            self.events
                .push_back(GauntletEvent::TournamentSizeChanged { old, new: size });
        }
        Ok(())
    }

    pub fn set_fee_rate(&mut self, caller: AccountId, bps: u16) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        let rate = FeeRate::new(bps).ok_or(GauntletError::InvalidFeeRate(bps))?;

        let old = std::mem::replace(&mut self.config.fee_rate, rate);
        if old != rate {
            self.events
                .push_back(GauntletEvent::FeeRateChanged { old, new: rate });
        }
        Ok(())
    }

    pub fn set_min_interval(&mut self, caller: AccountId, secs: u32) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        self.config.min_interval_secs = secs;
        self.events
            .push_back(GauntletEvent::MinIntervalChanged { secs });
        Ok(())
    }

    pub fn set_substitution_policy(
        &mut self,
        caller: AccountId,
        policy: SubstitutionPolicy,
    ) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        self.config.substitution_policy = policy;
        self.events
            .push_back(GauntletEvent::SubstitutionPolicyChanged { policy });
        Ok(())
    }

    /// Replace the reward table for one bracket size.
    ///
    /// Applies to tournaments executed after the change.
    pub fn set_reward_table(
        &mut self,
        caller: AccountId,
        size: usize,
        tiers: Vec<Reward>,
    ) -> GauntletResult<()> {
        self.ensure_operator(caller)?;
        let table = RewardTable::new(size, tiers)?;
        let tiers = table.tiers().len();

        self.config.rewards = std::mem::take(&mut self.config.rewards).with_table(table);
        info!("gauntlet: reward table for {size} replaced, {tiers} tiers");
        self.events
            .push_back(GauntletEvent::RewardTableChanged { size, tiers });
        Ok(())
    }

    /// Pay out every accumulated platform fee to `to`.
    pub fn withdraw_fees(&mut self, caller: AccountId, to: AccountId) -> GauntletResult<Amount> {
        self.ensure_operator(caller)?;
        let amount = self.accumulated_fees;
        if amount == 0 {
            return Err(GauntletError::NoFeesToWithdraw);
        }

        self.services.escrow.payout(
            to,
            amount,
            &format!("fees:{}", self.fee_withdrawals),
        )?;

        self.accumulated_fees = 0;
        self.fee_withdrawals += 1;
        info!("gauntlet: {amount} fees withdrawn to {to}");
        self.events
            .push_back(GauntletEvent::FeesWithdrawn { to, amount });

        Ok(amount)
    }

    // Queries

    #[must_use]
    pub fn config(&self) -> &GauntletConfig {
        &self.config
    }

    #[must_use]
    pub fn queue(&self) -> &ParticipantQueue {
        &self.queue
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn fee_pool(&self) -> Amount {
        self.queue.fee_pool()
    }

    #[must_use]
    pub fn queue_position(&self, participant_id: ParticipantId) -> Option<usize> {
        self.queue.position_of(participant_id)
    }

    #[must_use]
    pub fn status_of(&self, participant_id: ParticipantId) -> ParticipantStatus {
        self.statuses
            .get(&participant_id)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tournament(&self, id: TournamentId) -> Option<&Tournament> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.tournaments.get(index)
    }

    #[must_use]
    pub fn tournaments(&self) -> &[Tournament] {
        &self.tournaments
    }

    #[must_use]
    pub fn pending_tournament(&self) -> Option<&Tournament> {
        self.pending.and_then(|id| self.tournament(id))
    }

    #[must_use]
    pub fn accumulated_fees(&self) -> Amount {
        self.accumulated_fees
    }

    /// Fees held for entrants of the pending tournament.
    #[must_use]
    pub fn locked_funds(&self) -> Amount {
        self.pending_tournament()
            .map(Tournament::locked_funds)
            .unwrap_or(0)
    }

    pub fn drain_events(&mut self) -> VecDeque<GauntletEvent> {
        std::mem::take(&mut self.events)
    }

    // Helpers

    pub(super) fn ensure_operator(&self, caller: AccountId) -> GauntletResult<()> {
        if caller == self.config.operator {
            Ok(())
        } else {
            Err(GauntletError::Unauthorized(caller))
        }
    }

    /// The queue is frozen from the moment the selection value becomes
    /// readable until selection consumes it, so nobody can react to it.
    fn ensure_queue_unfrozen(&self) -> GauntletResult<()> {
        if let Some(tournament) = self.pending_tournament() {
            if tournament.phase == TournamentPhase::Committed
                && matches!(
                    tournament.selection.read(self.services.beacon.as_ref()),
                    Reveal::Available(_)
                )
            {
                return Err(GauntletError::QueueFrozen(tournament.id));
            }
        }
        Ok(())
    }

    /// Return an entry fee to its payer.
    ///
    /// The key depends only on the ticket, so whichever path refunds a slot
    /// first, every later attempt is a replay.
    pub(super) fn refund_slot(
        &self,
        payer: AccountId,
        fee: Amount,
        ticket: u64,
    ) -> GauntletResult<()> {
        if fee > 0 {
            self.services
                .escrow
                .refund(payer, fee, &format!("refund:{ticket}"))?;
        }
        Ok(())
    }

    /// Refund and remove queued slots one at a time from the tail.
    ///
    /// A failure leaves exactly the unrefunded slots queued.
    fn refund_queue(&mut self) -> GauntletResult<(usize, Amount)> {
        let (mut count, mut refunded): (usize, Amount) = (0, 0);
        while let Some(slot) = self.queue.slots().last().cloned() {
            if let Err(err) = self.refund_slot(slot.owner, slot.fee_paid, slot.ticket) {
                warn!("gauntlet: queue clear stopped after {count} refunds: {err}");
                if count > 0 {
                    self.events
                        .push_back(GauntletEvent::QueueCleared { count, refunded });
                }
                return Err(err);
            }

            self.queue.swap_remove(slot.participant_id);
            self.statuses.remove(&slot.participant_id);
            count += 1;
            refunded += slot.fee_paid;
        }
        Ok((count, refunded))
    }
}
