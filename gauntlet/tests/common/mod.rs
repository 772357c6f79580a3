//! Shared fixture for orchestrator integration tests.

#![allow(dead_code)]

use gauntlet::bracket::{Contestant, FightOutcome, Side};
use gauntlet::external::FightResolver;
use gauntlet::external::memory::{
    CoinFlipResolver, InMemoryEscrow, InMemoryRegistry, InMemoryRewardLedger, ManualClock,
    SimulatedBeacon,
};
use gauntlet::orchestrator::{Collaborators, Gauntlet, GauntletConfig, TickOutcome};
use gauntlet::queue::LoadoutRef;
use gauntlet::randomness::Entropy;
use gauntlet::TournamentId;
use std::sync::Arc;

pub const OPERATOR: u64 = 999;
pub const FEE: u64 = 100;

/// Lower participant id always wins; the fallback loses to every real entrant.
pub struct LowestIdWins;

impl FightResolver for LowestIdWins {
    fn resolve(&self, a: &Contestant, b: &Contestant, _seed: &Entropy) -> FightOutcome {
        let rank = |c: &Contestant| c.entrant.participant_id().unwrap_or(u64::MAX);
        let winner = if rank(a) <= rank(b) { Side::A } else { Side::B };
        FightOutcome {
            winner,
            combat_log: Vec::new(),
        }
    }
}

pub struct Arena {
    pub gauntlet: Gauntlet,
    pub clock: ManualClock,
    pub beacon: SimulatedBeacon,
    pub registry: InMemoryRegistry,
    pub escrow: InMemoryEscrow,
    pub ledger: InMemoryRewardLedger,
}

pub fn config() -> GauntletConfig {
    GauntletConfig {
        operator: OPERATOR,
        ..GauntletConfig::default()
    }
}

pub fn arena(config: GauntletConfig) -> Arena {
    arena_with_resolver(config, Arc::new(CoinFlipResolver))
}

pub fn arena_with_resolver(config: GauntletConfig, resolver: Arc<dyn FightResolver>) -> Arena {
    let clock = ManualClock::default();
    let beacon = SimulatedBeacon::with_secret(2024, 1, 8);
    let registry = InMemoryRegistry::new();
    let escrow = InMemoryEscrow::new();
    let ledger = InMemoryRewardLedger::new();

    let services = Collaborators {
        clock: Arc::new(clock.clone()),
        beacon: Arc::new(beacon.clone()),
        registry: Arc::new(registry.clone()),
        escrow: Arc::new(escrow.clone()),
        resolver,
        ledger: Arc::new(ledger.clone()),
    };

    Arena {
        gauntlet: Gauntlet::new(config, services).expect("valid config"),
        clock,
        beacon,
        registry,
        escrow,
        ledger,
    }
}

impl Arena {
    /// Register participant `id` owned by account `id` and fund it for one entry.
    pub fn sign_up(&self, id: u64) {
        self.registry.register(id, id);
        self.escrow.deposit(id, self.gauntlet.config().entry_fee);
    }

    pub fn enqueue_all(&mut self, ids: impl IntoIterator<Item = u64>) {
        for id in ids {
            self.sign_up(id);
            let fee = self.gauntlet.config().entry_fee;
            self.gauntlet
                .enqueue(id, id, LoadoutRef(id as u32), fee)
                .expect("enqueue");
        }
    }

    pub fn commit(&mut self) -> TournamentId {
        match self.gauntlet.tick().expect("tick") {
            TickOutcome::Committed(id) => id,
            other => panic!("expected commit, got {other:?}"),
        }
    }

    pub fn select(&mut self) -> TournamentId {
        self.beacon.advance(2);
        match self.gauntlet.tick().expect("tick") {
            TickOutcome::Selected(id) => id,
            other => panic!("expected selection, got {other:?}"),
        }
    }

    pub fn execute(&mut self) -> TournamentId {
        self.beacon.advance(2);
        match self.gauntlet.tick().expect("tick") {
            TickOutcome::Completed(id) => id,
            other => panic!("expected completion, got {other:?}"),
        }
    }

    /// Commit, select and execute one tournament.
    pub fn run_tournament(&mut self) -> TournamentId {
        let id = self.commit();
        assert_eq!(self.select(), id);
        assert_eq!(self.execute(), id);
        id
    }
}
