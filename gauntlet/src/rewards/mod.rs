//! Fee split, prize payout planning and tiered placement rewards.

pub mod fees;
pub mod tiers;

pub use fees::{BPS_DENOMINATOR, FeeRate, FeeSplit, PayoutPlan, PrizeRecipient};
pub use tiers::{Reward, RewardSchedule, RewardTable, RewardTableError};
