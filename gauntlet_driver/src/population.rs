//! Simulated participants and beacon outages.

use gauntlet::{
    Gauntlet, GauntletError,
    external::memory::{InMemoryEscrow, InMemoryRegistry, SimulatedBeacon},
    orchestrator::ParticipantStatus,
    queue::{LoadoutRef, ParticipantId},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::{BeaconConfig, PopulationConfig};

/// Participants that join, leave and occasionally get retired at random.
///
/// Participant `n` is controlled by account `n` and fights with loadout `n`.
pub struct Population {
    config: PopulationConfig,
    registry: InMemoryRegistry,
    escrow: InMemoryEscrow,
    rng: StdRng,
    retired: Vec<ParticipantId>,
}

impl Population {
    pub fn new(config: PopulationConfig, registry: InMemoryRegistry, escrow: InMemoryEscrow) -> Self {
        for id in 1..=config.participants {
            registry.register(id, id);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            config,
            registry,
            escrow,
            rng,
            retired: Vec::new(),
        }
    }

    /// Let every participant act once.
    pub fn step(&mut self, gauntlet: &mut Gauntlet) {
        let fee = gauntlet.config().entry_fee;

        for id in 1..=self.config.participants {
            match gauntlet.status_of(id) {
                ParticipantStatus::Idle => {
                    if self.retired.contains(&id) || !self.rng.random_bool(self.config.join_chance) {
                        continue;
                    }
                    if self.escrow.balance(id) < fee {
                        self.escrow.deposit(id, fee.saturating_mul(10));
                    }
                    log_rejection(id, gauntlet.enqueue(id, id, LoadoutRef(id as u32), fee));
                }
                ParticipantStatus::Queued => {
                    if self.rng.random_bool(self.config.leave_chance) {
                        log_rejection(id, gauntlet.withdraw(id, id).map(|_| ()));
                    }
                }
                ParticipantStatus::InTournament(tournament_id) => {
                    if self.rng.random_bool(self.config.retire_chance) {
                        tracing::info!("participant {id} retired during tournament {tournament_id}");
                        self.registry.retire(id);
                        self.retired.push(id);
                    }
                }
            }
        }

        // Retired participants come back once their tournament is over.
        let registry = &self.registry;
        self.retired.retain(|&id| {
            let done = gauntlet.status_of(id) == ParticipantStatus::Idle;
            if done {
                registry.register(id, id);
            }
            !done
        });
    }
}

fn log_rejection(participant_id: ParticipantId, result: Result<(), GauntletError>) {
    if let Err(e) = result {
        tracing::debug!(
            participant_id,
            "participant action rejected: {}",
            e.client_message()
        );
    }
}

/// Stalls the beacon now and then so recovery gets exercised.
pub struct OutageSimulator {
    config: BeaconConfig,
    beacon: SimulatedBeacon,
    rng: StdRng,
    remaining: u32,
}

impl OutageSimulator {
    pub fn new(config: BeaconConfig, beacon: SimulatedBeacon) -> Self {
        let rng = match config.secret {
            Some(secret) => StdRng::seed_from_u64(secret),
            None => StdRng::from_os_rng(),
        };

        Self {
            config,
            beacon,
            rng,
            remaining: 0,
        }
    }

    /// Advance the beacon one round, starting or ending an outage as needed.
    pub fn step(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                tracing::warn!("beacon outage over");
                self.beacon.set_unresponsive(false);
            }
        } else if self.config.outage_ticks > 0 && self.rng.random_bool(self.config.outage_chance) {
            tracing::warn!("beacon outage for {} ticks", self.config.outage_ticks);
            self.remaining = self.config.outage_ticks;
            self.beacon.set_unresponsive(true);
        }

        self.beacon.advance(1);
    }
}
