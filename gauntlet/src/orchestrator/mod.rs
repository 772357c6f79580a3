//! Tournament orchestrator.
//!
//! This module ties the queue, randomness, bracket and reward pieces together:
//! - Queue entry points with fee collection and refunds
//! - The commit / select / execute state machine driven by [`Gauntlet::tick`]
//! - Timeout recovery for tournaments whose randomness never arrives
//! - Operator administration and fee withdrawal
//! - An event queue for external indexers
//!
//! ## Example
//!
//! ```
//! use gauntlet::external::memory::{
//!     CoinFlipResolver, InMemoryEscrow, InMemoryRegistry, InMemoryRewardLedger, ManualClock,
//!     SimulatedBeacon,
//! };
//! use gauntlet::orchestrator::{Collaborators, Gauntlet, GauntletConfig, TickOutcome};
//! use gauntlet::queue::LoadoutRef;
//! use std::sync::Arc;
//!
//! let registry = InMemoryRegistry::new();
//! let escrow = InMemoryEscrow::new();
//! let beacon = SimulatedBeacon::with_secret(7, 1, 16);
//! for id in 1..=4 {
//!     registry.register(id, id);
//!     escrow.deposit(id, 100);
//! }
//!
//! let services = Collaborators {
//!     clock: Arc::new(ManualClock::default()),
//!     beacon: Arc::new(beacon.clone()),
//!     registry: Arc::new(registry),
//!     escrow: Arc::new(escrow),
//!     resolver: Arc::new(CoinFlipResolver),
//!     ledger: Arc::new(InMemoryRewardLedger::new()),
//! };
//! let mut gauntlet = Gauntlet::new(GauntletConfig::default(), services)?;
//! for id in 1..=4 {
//!     gauntlet.enqueue(id, id, LoadoutRef(0), 100)?;
//! }
//!
//! assert_eq!(gauntlet.tick()?, TickOutcome::Committed(1));
//! beacon.advance(2);
//! assert_eq!(gauntlet.tick()?, TickOutcome::Selected(1));
//! beacon.advance(2);
//! assert_eq!(gauntlet.tick()?, TickOutcome::Completed(1));
//! # Ok::<(), gauntlet::orchestrator::GauntletError>(())
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod manager;
pub mod models;
mod state_machine;

pub use config::{ConfigError, GauntletConfig};
pub use errors::{GauntletError, GauntletResult};
pub use events::GauntletEvent;
pub use manager::{Collaborators, Gauntlet};
pub use models::{
    ParticipantStatus, Placement, SelectedEntry, TickOutcome, Tournament, TournamentId,
    TournamentPhase, TournamentState, WaitReason,
};
