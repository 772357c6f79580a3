//! Randomness beacon contract and the commitments bound to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entropy::Entropy;
use crate::orchestrator::TournamentId;

/// A reference to a future value, e.g. a round or block number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Anchor(pub u64);

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of reading an anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reveal {
    /// The value exists and can be consumed.
    Available(Entropy),
    /// The anchor point has not been reached yet.
    Pending,
    /// The observability window has passed; the value can no longer be read.
    Expired,
}

/// A delayed source of unpredictable values.
pub trait RandomnessBeacon: Send + Sync {
    /// Request a value that does not exist yet and return where it will appear.
    fn commit(&self) -> Anchor;

    /// Read the value for a previously committed anchor.
    fn reveal(&self, anchor: Anchor) -> Reveal;
}

/// An anchor bound to one tournament step. Never re-chosen once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessCommitment {
    pub anchor: Anchor,
    pub tournament_id: TournamentId,
    pub requested_at: DateTime<Utc>,
}

impl RandomnessCommitment {
    /// Ask the beacon for a fresh anchor and bind it to `tournament_id`.
    pub fn request(
        beacon: &dyn RandomnessBeacon,
        tournament_id: TournamentId,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            anchor: beacon.commit(),
            tournament_id,
            requested_at,
        }
    }

    pub fn read(&self, beacon: &dyn RandomnessBeacon) -> Reveal {
        beacon.reveal(self.anchor)
    }
}
