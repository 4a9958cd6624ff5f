//! A creator-attributed purchase followed through pricing, commission,
//! payout and verification, using only the shared domain rules.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use solewave_core::cart::{Cart, CartLine};
use solewave_core::checkout::{AppliedCoupon, CheckoutError, CheckoutQuote};
use solewave_core::coupon::CouponCode;
use solewave_core::credits::{
    CreditError, credits_for_dollars, credits_for_purchase, dollars_for_credits,
};
use solewave_core::tier::CreatorTier;
use solewave_core::{OrderStatus, ProductId, UserId};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn line(id: i64, price: &str, quantity: u32) -> CartLine {
    CartLine {
        product_id: ProductId::new(id),
        size: Some("10".to_string()),
        title: format!("Sneaker {id}"),
        brand: "Solewave".to_string(),
        image: None,
        unit_price: d(price),
        quantity,
    }
}

fn coupon(tier: CreatorTier) -> AppliedCoupon {
    AppliedCoupon {
        code: CouponCode::parse("kicksbyjay").unwrap(),
        discount_percent: 10,
        creator_id: UserId::new(42),
        creator_tier: tier,
    }
}

#[test]
fn coupon_purchase_pays_commission_on_discounted_subtotal() {
    let mut cart = Cart::default();
    cart.add(line(1, "129.00", 1)).unwrap();
    cart.add(line(2, "85.50", 2)).unwrap();
    assert_eq!(cart.subtotal(), d("300.00"));

    let quote = CheckoutQuote::compute(cart.subtotal(), Some(&coupon(CreatorTier::Rising)), 0, 0)
        .unwrap();
    assert_eq!(quote.discount_amount, d("30.00"));
    assert_eq!(quote.total, d("270.00"));
    assert_eq!(quote.commission_amount, d("27.00"));
    assert_eq!(quote.creator_id, Some(UserId::new(42)));

    // Paying the creator out converts the commission at the flat rate
    assert_eq!(credits_for_dollars(quote.commission_amount), 2_700);
}

#[test]
fn credits_reduce_total_but_not_commission() {
    let quote = CheckoutQuote::compute(
        d("200.00"),
        Some(&coupon(CreatorTier::Elite)),
        5_000,
        12_000,
    )
    .unwrap();

    assert_eq!(quote.discount_amount, d("20.00"));
    assert_eq!(quote.credit_discount, d("50.00"));
    assert_eq!(quote.total, d("130.00"));
    assert_eq!(quote.commission_amount, d("36.00"));
}

#[test]
fn redemption_is_capped_at_the_amount_due() {
    let quote = CheckoutQuote::compute(d("40.00"), None, 10_000, 10_000).unwrap();
    assert_eq!(quote.credits_redeemed, 4_000);
    assert_eq!(quote.total, Decimal::ZERO);
}

#[test]
fn invalid_redemptions_are_refused() {
    assert_eq!(
        CheckoutQuote::compute(d("80.00"), None, 100, 1_000),
        Err(CheckoutError::Credits(CreditError::BelowMinimum))
    );
    assert!(matches!(
        CheckoutQuote::compute(d("80.00"), None, 2_000, 1_000),
        Err(CheckoutError::Credits(CreditError::Insufficient { .. }))
    ));
}

#[test]
fn purchased_credits_carry_a_bonus_that_payouts_do_not() {
    assert_eq!(credits_for_purchase(d("100")), 12_000);
    assert_eq!(credits_for_dollars(d("100")), 10_000);
    assert_eq!(dollars_for_credits(12_000), d("120.00"));
}

#[test]
fn verification_raises_tier_and_grants_bonus() {
    let payout = CreatorTier::payout_tier_for_followers(30_000).unwrap();
    assert_eq!(payout, CreatorTier::Established);
    assert_eq!(payout.verification_bonus_credits(), 1_500);

    assert_eq!(CreatorTier::Rising.upgraded_to(payout), CreatorTier::Established);
    // Never lowers a tier an admin already granted
    assert_eq!(CreatorTier::Elite.upgraded_to(payout), CreatorTier::Elite);

    assert_eq!(CreatorTier::payout_tier_for_followers(4_999), None);
}

#[test]
fn order_lifecycle_and_sale_accounting() {
    let happy_path = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Refunded,
    ];
    for pair in happy_path.windows(2) {
        if let [from, to] = pair {
            assert!(from.can_transition_to(*to), "{from} -> {to}");
        }
    }

    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Paid));

    // Only sales count toward commission and revenue
    let sales: Vec<OrderStatus> = OrderStatus::ALL
        .iter()
        .copied()
        .filter(|s| s.counts_as_sale())
        .collect();
    assert_eq!(sales, OrderStatus::SALES);

    // Restock only when the goods never left
    assert!(OrderStatus::Paid.restocks_on_cancel());
    assert!(!OrderStatus::Shipped.restocks_on_cancel());
}
