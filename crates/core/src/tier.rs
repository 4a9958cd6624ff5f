//! Creator commission tiers.
//!
//! Three fixed tiers pay 10 %, 15 % and 20 % of the discounted subtotal of every
//! order placed with the creator's coupon. The same tiers double as payout
//! levels for verified follower counts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_cents;
use crate::types::status::{ParseStatusError, status_strings};

/// Follower counts below this are not eligible for any tier.
pub const MIN_VERIFIED_FOLLOWERS: i64 = 5_000;

/// Lower bound (inclusive) of the `Established` follower band.
pub const ESTABLISHED_FOLLOWERS: i64 = 25_000;

/// Lower bound (inclusive) of the `Elite` follower band.
pub const ELITE_FOLLOWERS: i64 = 100_000;

/// Commission tier of a creator. Ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.creator_tier", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CreatorTier {
    /// 10 % commission.
    #[default]
    Rising,
    /// 15 % commission.
    Established,
    /// 20 % commission.
    Elite,
}

status_strings!(CreatorTier, "creator tier", {
    Rising => "rising",
    Established => "established",
    Elite => "elite",
});

impl CreatorTier {
    /// Commission rate as a fraction (0.10, 0.15, 0.20).
    #[must_use]
    pub fn commission_rate(self) -> Decimal {
        match self {
            Self::Rising => Decimal::new(10, 2),
            Self::Established => Decimal::new(15, 2),
            Self::Elite => Decimal::new(20, 2),
        }
    }

    /// Commission earned on `amount`, rounded to cents. Never negative.
    #[must_use]
    pub fn commission_for(self, amount: Decimal) -> Decimal {
        if amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_cents(amount * self.commission_rate())
    }

    /// Payout tier for a verified follower count.
    ///
    /// | followers          | tier          |
    /// |--------------------|---------------|
    /// | `< 5 000`          | none          |
    /// | `5 000..25 000`    | `Rising`      |
    /// | `25 000..100 000`  | `Established` |
    /// | `>= 100 000`       | `Elite`       |
    #[must_use]
    pub const fn payout_tier_for_followers(followers: i64) -> Option<Self> {
        if followers >= ELITE_FOLLOWERS {
            Some(Self::Elite)
        } else if followers >= ESTABLISHED_FOLLOWERS {
            Some(Self::Established)
        } else if followers >= MIN_VERIFIED_FOLLOWERS {
            Some(Self::Rising)
        } else {
            None
        }
    }

    /// One-off credits granted when a social verification is approved at this tier.
    #[must_use]
    pub const fn verification_bonus_credits(self) -> i64 {
        match self {
            Self::Rising => 500,
            Self::Established => 1_500,
            Self::Elite => 5_000,
        }
    }

    /// Tier after a verification: approval only ever raises a tier.
    #[must_use]
    pub fn upgraded_to(self, verified: Self) -> Self {
        self.max(verified)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_commission_rates() {
        assert_eq!(CreatorTier::Rising.commission_rate(), d("0.10"));
        assert_eq!(CreatorTier::Established.commission_rate(), d("0.15"));
        assert_eq!(CreatorTier::Elite.commission_rate(), d("0.20"));
    }

    #[test]
    fn test_commission_rounds_to_cents() {
        assert_eq!(CreatorTier::Established.commission_for(d("189.99")), d("28.50"));
        assert_eq!(CreatorTier::Rising.commission_for(d("0.05")), d("0.01"));
        assert_eq!(CreatorTier::Elite.commission_for(d("250")), d("50.00"));
    }

    #[test]
    fn test_commission_never_negative() {
        assert_eq!(CreatorTier::Elite.commission_for(d("-10")), Decimal::ZERO);
        assert_eq!(CreatorTier::Elite.commission_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_follower_table_boundaries() {
        assert_eq!(CreatorTier::payout_tier_for_followers(0), None);
        assert_eq!(CreatorTier::payout_tier_for_followers(4_999), None);
        assert_eq!(
            CreatorTier::payout_tier_for_followers(5_000),
            Some(CreatorTier::Rising)
        );
        assert_eq!(
            CreatorTier::payout_tier_for_followers(24_999),
            Some(CreatorTier::Rising)
        );
        assert_eq!(
            CreatorTier::payout_tier_for_followers(25_000),
            Some(CreatorTier::Established)
        );
        assert_eq!(
            CreatorTier::payout_tier_for_followers(99_999),
            Some(CreatorTier::Established)
        );
        assert_eq!(
            CreatorTier::payout_tier_for_followers(100_000),
            Some(CreatorTier::Elite)
        );
    }

    #[test]
    fn test_upgrade_never_downgrades() {
        assert_eq!(
            CreatorTier::Elite.upgraded_to(CreatorTier::Rising),
            CreatorTier::Elite
        );
        assert_eq!(
            CreatorTier::Rising.upgraded_to(CreatorTier::Established),
            CreatorTier::Established
        );
    }

    #[test]
    fn test_tier_strings() {
        assert_eq!(CreatorTier::Established.to_string(), "established");
        assert_eq!("elite".parse::<CreatorTier>().unwrap(), CreatorTier::Elite);
        assert!("gold".parse::<CreatorTier>().is_err());
    }
}
