//! Randomness commitments and seed derivation.
//!
//! A tournament never reads randomness it chose itself: it first binds an
//! [`Anchor`] that points at a value which does not exist yet, and only a
//! later tick reads the value once the beacon has revealed it.

pub mod beacon;
pub mod entropy;

pub use beacon::{Anchor, RandomnessBeacon, RandomnessCommitment, Reveal};
pub use entropy::Entropy;
