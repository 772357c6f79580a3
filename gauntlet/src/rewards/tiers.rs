//! Tiered experience/ticket rewards by placement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::bracket::is_supported_size;

/// Reward table errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewardTableError {
    #[error("unsupported tournament size: {0}")]
    UnsupportedSize(usize),

    #[error("{tiers} tiers for size {size}; at most {max} allowed")]
    TooManyTiers { size: usize, tiers: usize, max: usize },

    #[error("tier {tier} pays more than the tier above it")]
    NotMonotonic { tier: usize },
}

/// Non-monetary award.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub experience: u64,
    pub tickets: u64,
}

impl Reward {
    #[must_use]
    pub const fn new(experience: u64, tickets: u64) -> Self {
        Self {
            experience,
            tickets,
        }
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.experience == 0 && self.tickets == 0
    }

    /// True if this reward is at least `other` in every component.
    #[must_use]
    pub const fn covers(&self, other: &Self) -> bool {
        self.experience >= other.experience && self.tickets >= other.tickets
    }
}

/// Rewards for one tournament size, indexed by placement tier.
///
/// Tier 0 is the champion, tier 1 the runner-up, tier 2 the semi-final
/// losers, and so on. First-round losers never get a tier. Later tiers never
/// pay more than earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRewardTable")]
pub struct RewardTable {
    size: usize,
    tiers: Vec<Reward>,
}

#[derive(Deserialize)]
struct RawRewardTable {
    size: usize,
    tiers: Vec<Reward>,
}

impl TryFrom<RawRewardTable> for RewardTable {
    type Error = RewardTableError;

    fn try_from(raw: RawRewardTable) -> Result<Self, Self::Error> {
        Self::new(raw.size, raw.tiers)
    }
}

impl RewardTable {
    pub fn new(size: usize, tiers: Vec<Reward>) -> Result<Self, RewardTableError> {
        if !is_supported_size(size) {
            return Err(RewardTableError::UnsupportedSize(size));
        }

        // One tier per round; the last would be first-round losers.
        let max = size.trailing_zeros() as usize;
        if tiers.len() > max {
            return Err(RewardTableError::TooManyTiers {
                size,
                tiers: tiers.len(),
                max,
            });
        }

        if let Some(tier) = (1..tiers.len()).find(|&t| !tiers[t - 1].covers(&tiers[t])) {
            return Err(RewardTableError::NotMonotonic { tier });
        }

        Ok(Self { size, tiers })
    }

    /// Standard table: experience halves and tickets drop by one per tier.
    #[must_use]
    pub fn standard(size: usize, level_bracket: u32) -> Option<Self> {
        if !is_supported_size(size) {
            return None;
        }

        let tiers = size.trailing_zeros();
        let multiplier = u64::from(level_bracket) + 1;
        let rewards = (0..tiers)
            .map(|t| {
                Reward::new(
                    50 * (1u64 << (tiers - 1 - t)) * multiplier,
                    u64::from(tiers - t),
                )
            })
            .collect();

        Self::new(size, rewards).ok()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn tiers(&self) -> &[Reward] {
        &self.tiers
    }

    /// Reward for a placement tier; zero outside the table.
    #[must_use]
    pub fn reward_for_tier(&self, tier: u32) -> Reward {
        self.tiers.get(tier as usize).copied().unwrap_or_default()
    }
}

/// Reward tables for every configured size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    tables: BTreeMap<usize, RewardTable>,
}

impl RewardSchedule {
    /// No rewards for any size.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard tables for every supported size at the given level bracket.
    #[must_use]
    pub fn standard(level_bracket: u32) -> Self {
        let tables = crate::bracket::SUPPORTED_SIZES
            .iter()
            .filter_map(|&size| RewardTable::standard(size, level_bracket))
            .map(|table| (table.size(), table))
            .collect();
        Self { tables }
    }

    /// Replace the table for the table's size.
    #[must_use]
    pub fn with_table(mut self, table: RewardTable) -> Self {
        self.tables.insert(table.size(), table);
        self
    }

    #[must_use]
    pub fn table_for(&self, size: usize) -> Option<&RewardTable> {
        self.tables.get(&size)
    }

    #[must_use]
    pub fn reward_for(&self, size: usize, tier: u32) -> Reward {
        self.table_for(size)
            .map(|table| table.reward_for_tier(tier))
            .unwrap_or_default()
    }
}
