//! In-memory collaborators.
//!
//! Cheap to clone: every clone shares the same state, so a caller can hand
//! one copy to the orchestrator and keep another to inspect or steer it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{
    Clock, EligibilityRegistry, Escrow, FightResolver, Receipt, RewardLedger,
    errors::{EscrowError, EscrowResult},
};
use crate::bracket::{Contestant, FightOutcome, MatchResult, Side};
use crate::queue::{AccountId, Amount, ParticipantId};
use crate::randomness::{Anchor, Entropy, RandomnessBeacon, Reveal};
use crate::rewards::Reward;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *lock(&self.now) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

#[derive(Debug, Clone, Copy)]
struct RegistryRecord {
    owner: AccountId,
    eligible: bool,
}

/// Participant registry kept in a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    records: Arc<Mutex<HashMap<ParticipantId, RegistryRecord>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an eligible participant controlled by `owner`.
    pub fn register(&self, participant_id: ParticipantId, owner: AccountId) {
        lock(&self.records).insert(
            participant_id,
            RegistryRecord {
                owner,
                eligible: true,
            },
        );
    }

    /// Mark a participant as no longer eligible.
    pub fn retire(&self, participant_id: ParticipantId) {
        if let Some(record) = lock(&self.records).get_mut(&participant_id) {
            record.eligible = false;
        }
    }

    pub fn transfer(&self, participant_id: ParticipantId, new_owner: AccountId) {
        if let Some(record) = lock(&self.records).get_mut(&participant_id) {
            record.owner = new_owner;
        }
    }
}

impl EligibilityRegistry for InMemoryRegistry {
    fn is_eligible(&self, participant_id: ParticipantId) -> bool {
        lock(&self.records)
            .get(&participant_id)
            .is_some_and(|r| r.eligible)
    }

    fn owner_of(&self, participant_id: ParticipantId) -> Option<AccountId> {
        lock(&self.records).get(&participant_id).map(|r| r.owner)
    }
}

/// Entry direction, seen from the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}

/// Entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Collect,
    Refund,
    Payout,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Collect => write!(f, "collect"),
            EntryType::Refund => write!(f, "refund"),
            EntryType::Payout => write!(f, "payout"),
        }
    }
}

/// One applied escrow movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub account: AccountId,
    pub amount: Amount,
    pub direction: EntryDirection,
    pub entry_type: EntryType,
    pub idempotency_key: String,
}

#[derive(Debug, Default)]
struct EscrowBook {
    balances: HashMap<AccountId, Amount>,
    custody: Amount,
    entries: Vec<EscrowEntry>,
    keys: HashSet<String>,
    failing: bool,
    /// Calls left before the escrow starts failing.
    budget: Option<usize>,
}

impl EscrowBook {
    fn check_available(&mut self) -> EscrowResult<()> {
        if let Some(budget) = self.budget.as_mut() {
            if *budget == 0 {
                self.failing = true;
            } else {
                *budget -= 1;
            }
        }
        if self.failing {
            return Err(EscrowError::TransferFailed("escrow unavailable".to_string()));
        }
        Ok(())
    }
}

/// Escrow with account balances, a single custody pool and a ledger of
/// applied entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEscrow {
    book: Arc<Mutex<EscrowBook>>,
}

impl InMemoryEscrow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account from outside the system.
    pub fn deposit(&self, account: AccountId, amount: Amount) {
        let mut book = lock(&self.book);
        let balance = book.balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, account: AccountId) -> Amount {
        lock(&self.book).balances.get(&account).copied().unwrap_or(0)
    }

    /// Funds currently held in custody.
    pub fn custody(&self) -> Amount {
        lock(&self.book).custody
    }

    pub fn entries(&self) -> Vec<EscrowEntry> {
        lock(&self.book).entries.clone()
    }

    /// Make every following call fail until switched off again.
    pub fn set_failing(&self, failing: bool) {
        let mut book = lock(&self.book);
        book.failing = failing;
        book.budget = None;
    }

    /// Let `calls` more calls through, then fail every call after them.
    pub fn fail_after(&self, calls: usize) {
        let mut book = lock(&self.book);
        book.failing = false;
        book.budget = Some(calls);
    }

    fn transfer_out(
        &self,
        to: AccountId,
        amount: Amount,
        key: &str,
        entry_type: EntryType,
    ) -> EscrowResult<Receipt> {
        let mut book = lock(&self.book);
        book.check_available()?;
        if book.keys.contains(key) {
            return Ok(Receipt::Replayed);
        }
        if amount == 0 {
            return Err(EscrowError::InvalidAmount(amount));
        }
        if book.custody < amount {
            return Err(EscrowError::InsufficientCustody {
                held: book.custody,
                required: amount,
            });
        }

        book.custody -= amount;
        let balance = book.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        book.keys.insert(key.to_string());
        book.entries.push(EscrowEntry {
            account: to,
            amount,
            direction: EntryDirection::Credit,
            entry_type,
            idempotency_key: key.to_string(),
        });

        Ok(Receipt::Applied)
    }
}

impl Escrow for InMemoryEscrow {
    fn collect(&self, from: AccountId, amount: Amount, key: &str) -> EscrowResult<Receipt> {
        let mut book = lock(&self.book);
        book.check_available()?;
        if book.keys.contains(key) {
            return Ok(Receipt::Replayed);
        }
        if amount == 0 {
            return Err(EscrowError::InvalidAmount(amount));
        }

        let available = book.balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(EscrowError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        book.balances.insert(from, available - amount);
        book.custody += amount;
        book.keys.insert(key.to_string());
        book.entries.push(EscrowEntry {
            account: from,
            amount,
            direction: EntryDirection::Debit,
            entry_type: EntryType::Collect,
            idempotency_key: key.to_string(),
        });

        Ok(Receipt::Applied)
    }

    fn refund(&self, to: AccountId, amount: Amount, key: &str) -> EscrowResult<Receipt> {
        self.transfer_out(to, amount, key, EntryType::Refund)
    }

    fn payout(&self, to: AccountId, amount: Amount, key: &str) -> EscrowResult<Receipt> {
        self.transfer_out(to, amount, key, EntryType::Payout)
    }
}

/// Win/loss tally for one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossRecord {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Default)]
struct LedgerBook {
    rewards: HashMap<ParticipantId, Reward>,
    records: HashMap<ParticipantId, WinLossRecord>,
}

/// Reward ledger kept in maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRewardLedger {
    book: Arc<Mutex<LedgerBook>>,
}

impl InMemoryRewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rewards credited to a participant so far.
    pub fn rewards_of(&self, participant_id: ParticipantId) -> Reward {
        lock(&self.book)
            .rewards
            .get(&participant_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn record_of(&self, participant_id: ParticipantId) -> WinLossRecord {
        lock(&self.book)
            .records
            .get(&participant_id)
            .copied()
            .unwrap_or_default()
    }
}

impl RewardLedger for InMemoryRewardLedger {
    fn credit(&self, participant_id: ParticipantId, reward: Reward) {
        let mut book = lock(&self.book);
        let total = book.rewards.entry(participant_id).or_default();
        total.experience = total.experience.saturating_add(reward.experience);
        total.tickets = total.tickets.saturating_add(reward.tickets);
    }

    fn record_result(&self, participant_id: ParticipantId, result: MatchResult) {
        let mut book = lock(&self.book);
        let record = book.records.entry(participant_id).or_default();
        match result {
            MatchResult::Win => record.wins += 1,
            MatchResult::Loss => record.losses += 1,
        }
    }
}

#[derive(Debug)]
struct BeaconState {
    round: u64,
    unresponsive: bool,
}

/// Round-based beacon, in the style of a block-hash source.
///
/// A commitment points `delay` rounds ahead of the current round. The value
/// for round `n` can be read once the current round has moved past `n`, and
/// only for `window` rounds after that. Values are derived from a hidden
/// secret, so nobody holding only the anchor can predict them.
#[derive(Debug, Clone)]
pub struct SimulatedBeacon {
    secret: Entropy,
    delay: u64,
    window: u64,
    state: Arc<Mutex<BeaconState>>,
}

impl SimulatedBeacon {
    /// Beacon with a random secret.
    pub fn new(delay: u64, window: u64) -> Self {
        Self::with_secret(rand::random(), delay, window)
    }

    /// Beacon with a fixed secret for reproducible runs.
    pub fn with_secret(secret: u64, delay: u64, window: u64) -> Self {
        Self {
            secret: Entropy::from_seed(secret),
            delay: delay.max(1),
            window: window.max(1),
            state: Arc::new(Mutex::new(BeaconState {
                round: 0,
                unresponsive: false,
            })),
        }
    }

    pub fn round(&self) -> u64 {
        lock(&self.state).round
    }

    pub fn advance(&self, rounds: u64) {
        let mut state = lock(&self.state);
        state.round = state.round.saturating_add(rounds);
    }

    /// While unresponsive every reveal reports `Pending`.
    pub fn set_unresponsive(&self, unresponsive: bool) {
        lock(&self.state).unresponsive = unresponsive;
    }

    /// The value that will be revealed for `anchor`.
    pub fn value_at(&self, anchor: Anchor) -> Entropy {
        self.secret.derive(b"gauntlet/beacon", anchor.0, 0)
    }
}

impl RandomnessBeacon for SimulatedBeacon {
    fn commit(&self) -> Anchor {
        Anchor(lock(&self.state).round + self.delay)
    }

    fn reveal(&self, anchor: Anchor) -> Reveal {
        let state = lock(&self.state);
        if state.unresponsive || state.round <= anchor.0 {
            Reveal::Pending
        } else if state.round - anchor.0 > self.window {
            Reveal::Expired
        } else {
            Reveal::Available(self.value_at(anchor))
        }
    }
}

/// Resolver that flips a coin with the match seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinFlipResolver;

impl FightResolver for CoinFlipResolver {
    fn resolve(&self, a: &Contestant, b: &Contestant, seed: &Entropy) -> FightOutcome {
        let winner = if seed.to_u64() & 1 == 0 { Side::A } else { Side::B };
        let (w, l) = match winner {
            Side::A => (a, b),
            Side::B => (b, a),
        };

        FightOutcome {
            winner,
            combat_log: vec![format!("{} defeats {} ({seed})", w.entrant, l.entrant)],
        }
    }
}
