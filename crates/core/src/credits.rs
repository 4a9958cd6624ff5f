//! Credit/dollar conversion.
//!
//! One credit is worth one cent. Buying credits with a card earns a bonus that
//! grows with the purchase amount; every other conversion uses the flat rate.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Credits per dollar at the flat rate.
pub const CREDITS_PER_DOLLAR: i64 = 100;

/// Smallest number of credits that can be redeemed at checkout.
pub const MIN_REDEMPTION_CREDITS: i64 = 500;

/// Purchase bonus bands: `(minimum dollars, bonus percent)`, highest first.
const PURCHASE_BONUS_BANDS: [(i64, i64); 3] = [(100, 20), (50, 10), (25, 5)];

/// Errors from validating a credit redemption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    /// Fewer credits than [`MIN_REDEMPTION_CREDITS`] were requested.
    #[error("at least {MIN_REDEMPTION_CREDITS} credits must be redeemed")]
    BelowMinimum,
    /// The balance does not cover the request.
    #[error("insufficient credits: requested {requested}, available {available}")]
    Insufficient {
        /// Credits requested.
        requested: i64,
        /// Credits available.
        available: i64,
    },
}

/// Errors from moving a wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// The change would leave the balance below zero.
    #[error("credit balance cannot go negative")]
    Negative,
    /// The change overflows the balance.
    #[error("credit balance out of range")]
    OutOfRange,
}

/// Balance after applying the signed `delta` to `balance`.
///
/// Every wallet writer goes through this.
///
/// # Errors
///
/// Returns [`BalanceError::Negative`] if the result would be below zero, or
/// [`BalanceError::OutOfRange`] on overflow.
pub const fn apply_to_balance(balance: i64, delta: i64) -> Result<i64, BalanceError> {
    match balance.checked_add(delta) {
        Some(next) if next < 0 => Err(BalanceError::Negative),
        Some(next) => Ok(next),
        None => Err(BalanceError::OutOfRange),
    }
}

/// Credits at the flat rate for a dollar amount, floored. Non-positive amounts give 0.
#[must_use]
pub fn credits_for_dollars(dollars: Decimal) -> i64 {
    if dollars <= Decimal::ZERO {
        return 0;
    }
    (dollars * Decimal::from(CREDITS_PER_DOLLAR))
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Bonus percentage for a credit purchase of `dollars`.
#[must_use]
pub fn purchase_bonus_percent(dollars: Decimal) -> i64 {
    PURCHASE_BONUS_BANDS
        .iter()
        .find(|(min, _)| dollars >= Decimal::from(*min))
        .map_or(0, |(_, pct)| *pct)
}

/// Credits granted for buying credits with `dollars`, including the tiered bonus.
///
/// | purchase    | bonus |
/// |-------------|-------|
/// | `< $25`     | 0 %   |
/// | `>= $25`    | 5 %   |
/// | `>= $50`    | 10 %  |
/// | `>= $100`   | 20 %  |
#[must_use]
pub fn credits_for_purchase(dollars: Decimal) -> i64 {
    if dollars <= Decimal::ZERO {
        return 0;
    }
    let base = dollars * Decimal::from(CREDITS_PER_DOLLAR);
    let bonus = Decimal::from(100 + purchase_bonus_percent(dollars)) / Decimal::from(100);
    (base * bonus).floor().to_i64().unwrap_or(i64::MAX)
}

/// Dollar value of `credits`, truncated to cents. Negative input gives zero.
#[must_use]
pub fn dollars_for_credits(credits: i64) -> Decimal {
    if credits <= 0 {
        return Decimal::ZERO;
    }
    Decimal::new(credits, 2)
}

/// Check a checkout redemption against the minimum and the balance.
///
/// Zero means "no redemption" and is always valid.
///
/// # Errors
///
/// Returns [`CreditError`] when the request is below the minimum or exceeds
/// `balance`.
pub const fn validate_redemption(requested: i64, balance: i64) -> Result<(), CreditError> {
    if requested == 0 {
        return Ok(());
    }
    if requested < MIN_REDEMPTION_CREDITS {
        return Err(CreditError::BelowMinimum);
    }
    if requested > balance {
        return Err(CreditError::Insufficient {
            requested,
            available: balance,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_flat_rate() {
        assert_eq!(credits_for_dollars(d("12.345")), 1_234);
        assert_eq!(credits_for_dollars(d("0")), 0);
        assert_eq!(credits_for_dollars(d("-3")), 0);
    }

    #[test]
    fn test_purchase_bonus_bands() {
        assert_eq!(credits_for_purchase(d("24.99")), 2_499);
        assert_eq!(credits_for_purchase(d("25")), 2_625);
        assert_eq!(credits_for_purchase(d("50")), 5_500);
        assert_eq!(credits_for_purchase(d("99.99")), 10_998);
        assert_eq!(credits_for_purchase(d("100")), 12_000);
        assert_eq!(credits_for_purchase(d("500")), 60_000);
    }

    #[test]
    fn test_conversions_are_monotonic() {
        let mut last_purchase = 0;
        let mut last_flat = 0;
        let mut last_dollars = Decimal::ZERO;
        for cents in 0..=20_000_i64 {
            let dollars = Decimal::new(cents, 2);
            let purchase = credits_for_purchase(dollars);
            let flat = credits_for_dollars(dollars);
            assert!(purchase >= last_purchase, "purchase dipped at {dollars}");
            assert!(flat >= last_flat, "flat dipped at {dollars}");
            assert!(purchase >= flat);
            last_purchase = purchase;
            last_flat = flat;

            let back = dollars_for_credits(cents);
            assert!(back >= last_dollars);
            last_dollars = back;
        }
    }

    #[test]
    fn test_dollars_for_credits() {
        assert_eq!(dollars_for_credits(1_250), d("12.50"));
        assert_eq!(dollars_for_credits(1), d("0.01"));
        assert_eq!(dollars_for_credits(-5), Decimal::ZERO);
    }

    #[test]
    fn test_redemption_rules() {
        assert_eq!(validate_redemption(0, 0), Ok(()));
        assert_eq!(validate_redemption(499, 10_000), Err(CreditError::BelowMinimum));
        assert_eq!(validate_redemption(500, 500), Ok(()));
        assert_eq!(
            validate_redemption(800, 600),
            Err(CreditError::Insufficient {
                requested: 800,
                available: 600
            })
        );
    }

    #[test]
    fn test_balance_floor() {
        assert_eq!(apply_to_balance(1_000, 500), Ok(1_500));
        assert_eq!(apply_to_balance(1_000, -1_000), Ok(0));
        assert_eq!(apply_to_balance(1_000, -1_001), Err(BalanceError::Negative));
        assert_eq!(apply_to_balance(0, 0), Ok(0));
        assert_eq!(apply_to_balance(i64::MAX, 1), Err(BalanceError::OutOfRange));
    }
}
