//! Checkout pricing.
//!
//! Order of application: the creator coupon discounts the subtotal, then
//! credits pay down what is left. Commission is owed on the subtotal after the
//! coupon; paying with credits does not reduce it.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;

use crate::coupon::{CouponCode, apply_discount};
use crate::credits::{CREDITS_PER_DOLLAR, CreditError, dollars_for_credits, validate_redemption};
use crate::tier::CreatorTier;
use crate::types::UserId;

/// Errors from pricing a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Nothing to pay for.
    #[error("cart is empty")]
    EmptyCart,
    /// The requested credit redemption is not allowed.
    #[error(transparent)]
    Credits(#[from] CreditError),
}

/// A coupon resolved to its creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub discount_percent: i32,
    pub creator_id: UserId,
    pub creator_tier: CreatorTier,
}

/// Priced checkout, ready to be written as an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub credits_redeemed: i64,
    pub credit_discount: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<CouponCode>,
    #[serde(skip)]
    pub creator_id: Option<UserId>,
    #[serde(skip)]
    pub commission_rate: Option<Decimal>,
    #[serde(skip)]
    pub commission_amount: Decimal,
}

impl CheckoutQuote {
    /// Price a cart subtotal.
    ///
    /// `credits_requested` is validated against `credit_balance` and the
    /// redemption minimum, then reduced to what the order actually needs so
    /// the total never drops below zero.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for a non-positive subtotal and
    /// [`CheckoutError::Credits`] for an invalid redemption.
    pub fn compute(
        subtotal: Decimal,
        coupon: Option<&AppliedCoupon>,
        credits_requested: i64,
        credit_balance: i64,
    ) -> Result<Self, CheckoutError> {
        if subtotal <= Decimal::ZERO {
            return Err(CheckoutError::EmptyCart);
        }
        validate_redemption(credits_requested, credit_balance)?;

        let discount_amount =
            coupon.map_or(Decimal::ZERO, |c| apply_discount(subtotal, c.discount_percent));
        let after_coupon = subtotal - discount_amount;

        let credits_needed = (after_coupon * Decimal::from(CREDITS_PER_DOLLAR))
            .ceil()
            .to_i64()
            .unwrap_or(i64::MAX);
        let credits_redeemed = credits_requested.min(credits_needed).max(0);
        let credit_discount = dollars_for_credits(credits_redeemed).min(after_coupon);
        let total = after_coupon - credit_discount;

        let (commission_rate, commission_amount) = coupon.map_or((None, Decimal::ZERO), |c| {
            (
                Some(c.creator_tier.commission_rate()),
                c.creator_tier.commission_for(after_coupon),
            )
        });

        Ok(Self {
            subtotal,
            discount_amount,
            credits_redeemed,
            credit_discount,
            total,
            coupon_code: coupon.map(|c| c.code.clone()),
            creator_id: coupon.map(|c| c.creator_id),
            commission_rate,
            commission_amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn coupon(percent: i32, tier: CreatorTier) -> AppliedCoupon {
        AppliedCoupon {
            code: CouponCode::parse("JAYKICKS").unwrap(),
            discount_percent: percent,
            creator_id: UserId::new(9),
            creator_tier: tier,
        }
    }

    #[test]
    fn test_plain_checkout() {
        let quote = CheckoutQuote::compute(d("240.00"), None, 0, 0).unwrap();
        assert_eq!(quote.total, d("240.00"));
        assert_eq!(quote.discount_amount, Decimal::ZERO);
        assert_eq!(quote.commission_amount, Decimal::ZERO);
        assert_eq!(quote.creator_id, None);
    }

    #[test]
    fn test_coupon_then_credits() {
        let c = coupon(10, CreatorTier::Established);
        let quote = CheckoutQuote::compute(d("200.00"), Some(&c), 1_000, 5_000).unwrap();
        assert_eq!(quote.discount_amount, d("20.00"));
        assert_eq!(quote.credits_redeemed, 1_000);
        assert_eq!(quote.credit_discount, d("10.00"));
        assert_eq!(quote.total, d("170.00"));
        // 15 % of the post-coupon subtotal, credits do not reduce commission
        assert_eq!(quote.commission_amount, d("27.00"));
        assert_eq!(quote.commission_rate, Some(d("0.15")));
        assert_eq!(quote.creator_id, Some(UserId::new(9)));
    }

    #[test]
    fn test_credits_capped_to_total() {
        let quote = CheckoutQuote::compute(d("12.34"), None, 5_000, 5_000).unwrap();
        assert_eq!(quote.credits_redeemed, 1_234);
        assert_eq!(quote.total, Decimal::ZERO);
    }

    #[test]
    fn test_total_never_negative() {
        let c = coupon(50, CreatorTier::Rising);
        let quote = CheckoutQuote::compute(d("9.99"), Some(&c), 10_000, 10_000).unwrap();
        assert!(quote.total >= Decimal::ZERO);
        assert_eq!(quote.discount_amount + quote.credit_discount, d("9.99"));
    }

    #[test]
    fn test_rejects_empty_and_bad_redemptions() {
        assert_eq!(
            CheckoutQuote::compute(Decimal::ZERO, None, 0, 0),
            Err(CheckoutError::EmptyCart)
        );
        assert_eq!(
            CheckoutQuote::compute(d("50"), None, 100, 1_000),
            Err(CheckoutError::Credits(CreditError::BelowMinimum))
        );
        assert!(matches!(
            CheckoutQuote::compute(d("50"), None, 2_000, 1_000),
            Err(CheckoutError::Credits(CreditError::Insufficient { .. }))
        ));
    }
}
