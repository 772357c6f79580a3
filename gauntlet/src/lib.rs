//! # Gauntlet
//!
//! An elimination-bracket tournament orchestrator built around a polling
//! finite state machine.
//!
//! Participants pay an entry fee to join a queue. Once enough are waiting,
//! the orchestrator commits to a future randomness value, uses it to draw the
//! entrants from the queue, commits to a second value, and uses that one to
//! run a single-elimination bracket. The champion's controller receives the
//! prize pool minus a platform fee; everyone who placed is credited a tiered
//! reward.
//!
//! ## Architecture
//!
//! A tournament moves through three phases, each advanced by one call to
//! [`Gauntlet::tick`]:
//!
//! - **Committed**: a selection anchor is bound; the queue is untouched
//! - **Selected**: entrants are drawn, an execution anchor is bound
//! - **Completed**: the bracket ran and fees, prize and rewards were settled
//!
//! A tournament whose randomness never arrives can be **Recovered** by
//! anyone once its timeout has passed, refunding every selected entrant.
//!
//! ## Core Modules
//!
//! - [`orchestrator`]: the state machine, queue entry points and administration
//! - [`queue`]: the participant arena with O(1) removal
//! - [`selection`]: unbiased sampling of entrants from the queue
//! - [`bracket`]: the elimination walk with late substitution
//! - [`rewards`]: fee split and placement reward tables
//! - [`randomness`]: beacon commitments and seed derivation
//! - [`external`]: collaborator contracts and in-memory implementations

pub mod bracket;
pub mod external;
pub mod orchestrator;
pub mod queue;
pub mod randomness;
pub mod rewards;
pub mod selection;

pub use orchestrator::{
    Collaborators, Gauntlet, GauntletConfig, GauntletError, GauntletEvent, GauntletResult,
    TickOutcome, TournamentId,
};
