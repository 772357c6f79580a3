//! Seeded participant selection so nobody can choose their own bracket.

use thiserror::Error;

use crate::randomness::Entropy;

const SELECTION_LABEL: &[u8] = b"gauntlet/select";

/// Selection errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("need {needed} candidates, have {available}")]
    InsufficientCandidates { needed: usize, available: usize },
}

/// Draws entrants from the queue with a partial Fisher–Yates shuffle.
#[derive(Debug, Clone, Copy)]
pub struct ParticipantSelector {
    entropy: Entropy,
}

impl ParticipantSelector {
    #[must_use]
    pub const fn new(entropy: Entropy) -> Self {
        Self { entropy }
    }

    /// Select `count` distinct positions out of `0..candidates`.
    ///
    /// Step `i` swaps position `i` with one drawn uniformly from `i..candidates`,
    /// re-hashing the entropy with `i` each time. The first `count` entries of
    /// the partially shuffled order are returned in draw order, which doubles
    /// as the bracket seeding order.
    pub fn select(&self, candidates: usize, count: usize) -> Result<Vec<usize>, SelectionError> {
        if count > candidates {
            return Err(SelectionError::InsufficientCandidates {
                needed: count,
                available: candidates,
            });
        }

        let mut order: Vec<usize> = (0..candidates).collect();
        for i in 0..count {
            let remaining = (candidates - i) as u64;
            let offset = self.entropy.uniform_below(SELECTION_LABEL, i as u64, remaining);
            order.swap(i, i + offset as usize);
        }

        order.truncate(count);
        Ok(order)
    }
}
