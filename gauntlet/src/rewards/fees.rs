//! Entry fee split between the platform and the prize.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::queue::{AccountId, Amount};

/// Basis points in one whole.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Platform fee rate in basis points, always within `0..=10_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct FeeRate(u16);

impl FeeRate {
    pub const ZERO: Self = Self(0);

    /// `None` if `bps` exceeds 10 000.
    #[must_use]
    pub const fn new(bps: u16) -> Option<Self> {
        if bps <= BPS_DENOMINATOR {
            Some(Self(bps))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn bps(&self) -> u16 {
        self.0
    }

    /// Fee owed on `amount`, rounded down.
    #[must_use]
    pub fn apply(&self, amount: Amount) -> Amount {
        // Fits back into u64 because the result never exceeds `amount`.
        (u128::from(amount) * u128::from(self.0) / u128::from(BPS_DENOMINATOR)) as Amount
    }
}

impl TryFrom<u16> for FeeRate {
    type Error = String;

    fn try_from(bps: u16) -> Result<Self, Self::Error> {
        Self::new(bps).ok_or_else(|| format!("fee rate {bps} bps exceeds {BPS_DENOMINATOR}"))
    }
}

impl From<FeeRate> for u16 {
    fn from(rate: FeeRate) -> Self {
        rate.0
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

/// Split of a tournament's collected fees.
///
/// `platform_fee + prize == total_collected` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub total_collected: Amount,
    pub platform_fee: Amount,
    pub prize: Amount,
}

impl FeeSplit {
    #[must_use]
    pub fn compute(total_collected: Amount, rate: FeeRate) -> Self {
        let platform_fee = rate.apply(total_collected);
        Self {
            total_collected,
            platform_fee,
            prize: total_collected - platform_fee,
        }
    }

    /// Split for `size` entrants paying `entry_fee` each. `None` on overflow.
    #[must_use]
    pub fn for_entries(entry_fee: Amount, size: usize, rate: FeeRate) -> Option<Self> {
        let total = entry_fee.checked_mul(size as Amount)?;
        Some(Self::compute(total, rate))
    }
}

/// Where the prize goes once the champion is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrizeRecipient {
    /// Champion's current controller.
    Controller(AccountId),
    /// No eligible recipient; the prize is kept as platform fees.
    House,
}

/// Prize destination and the fees the platform accrues from one tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    pub split: FeeSplit,
    pub recipient: PrizeRecipient,
    pub fees_accrued: Amount,
}

impl PayoutPlan {
    #[must_use]
    pub fn new(split: FeeSplit, recipient: PrizeRecipient) -> Self {
        let fees_accrued = match recipient {
            PrizeRecipient::Controller(_) => split.platform_fee,
            PrizeRecipient::House => split.total_collected,
        };

        Self {
            split,
            recipient,
            fees_accrued,
        }
    }

    /// Amount actually transferred out as prize money.
    #[must_use]
    pub fn prize_paid(&self) -> Amount {
        match self.recipient {
            PrizeRecipient::Controller(_) => self.split.prize,
            PrizeRecipient::House => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(bps: u16) -> FeeRate {
        FeeRate::new(bps).expect("valid rate")
    }

    #[test]
    fn test_ten_percent_of_four_hundred() {
        let split = FeeSplit::for_entries(100, 4, rate(1000)).expect("no overflow");
        assert_eq!(split.total_collected, 400);
        assert_eq!(split.platform_fee, 40);
        assert_eq!(split.prize, 360);
    }

    #[test]
    fn test_fee_rounds_down() {
        let split = FeeSplit::compute(999, rate(333));
        assert_eq!(split.platform_fee, 33);
        assert_eq!(split.prize, 966);
    }

    #[test]
    fn test_rate_bounds() {
        assert!(FeeRate::new(10_000).is_some());
        assert!(FeeRate::new(10_001).is_none());
        assert_eq!(FeeSplit::compute(500, rate(10_000)).prize, 0);
        assert_eq!(FeeSplit::compute(500, FeeRate::ZERO).platform_fee, 0);
    }

    #[test]
    fn test_large_totals_do_not_overflow() {
        let split = FeeSplit::compute(u64::MAX, rate(9_999));
        assert_eq!(split.platform_fee + split.prize, u64::MAX);
    }

    #[test]
    fn test_entry_overflow() {
        assert!(FeeSplit::for_entries(u64::MAX, 4, rate(0)).is_none());
    }

    #[test]
    fn test_controller_plan() {
        let plan = PayoutPlan::new(FeeSplit::compute(400, rate(1000)), PrizeRecipient::Controller(7));
        assert_eq!(plan.prize_paid(), 360);
        assert_eq!(plan.fees_accrued, 40);
    }

    #[test]
    fn test_house_plan_keeps_everything() {
        let plan = PayoutPlan::new(FeeSplit::compute(400, rate(1000)), PrizeRecipient::House);
        assert_eq!(plan.prize_paid(), 0);
        assert_eq!(plan.fees_accrued, 400);
    }

    #[test]
    fn test_fee_rate_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<FeeRate>("10001").is_err());
        assert_eq!(serde_json::from_str::<FeeRate>("250").ok(), FeeRate::new(250));
    }
}
