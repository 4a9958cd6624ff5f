//! Checkout: pricing, order placement, payment and compensation.
//!
//! Placement happens in two phases. The first is a single database transaction
//! that locks the products and the buyer's profile, checks stock, prices the
//! order from current catalog prices, decrements stock, writes the `pending`
//! order and debits redeemed credits. The second charges the gateway. If the
//! charge fails, a compensating transaction cancels the order, restocks the
//! items and refunds the credits.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use solewave_core::cart::Cart;
use solewave_core::checkout::{AppliedCoupon, CheckoutError, CheckoutQuote};
use solewave_core::coupon::{CouponCode, CouponCodeError};
use solewave_core::credits::dollars_for_credits;
use solewave_core::{
    OrderId, OrderStatus, ProductId, TransactionStatus, TransactionType, UserId, round_cents,
};

use super::payment::{PaymentError, PaymentGateway};
use crate::db::orders::{self, NewOrderItem};
use crate::db::wallet::{self, NewTransaction};
use crate::db::{CreatorRepository, RepositoryError, WalletRepository};
use crate::models::order::ShippingAddress;

/// Errors from quoting or placing an order.
#[derive(Debug, Error)]
pub enum CheckoutFailure {
    /// Pricing rejected the cart or the credit redemption.
    #[error(transparent)]
    Pricing(#[from] CheckoutError),

    /// The coupon code is malformed.
    #[error("invalid coupon code: {0}")]
    InvalidCoupon(#[from] CouponCodeError),

    /// No active creator owns the coupon code.
    #[error("coupon code not found")]
    UnknownCoupon,

    /// Creators cannot discount their own orders.
    #[error("you cannot use your own coupon code")]
    OwnCoupon,

    /// A shipping field is blank.
    #[error("shipping {0} is required")]
    InvalidShipping(&'static str),

    /// A product in the cart was removed or deactivated.
    #[error("{title} is no longer available")]
    Unavailable { title: String },

    /// Not enough stock for a product in the cart.
    #[error("only {available} left of {title}")]
    OutOfStock { title: String, available: i32 },

    /// The gateway declined the payment; the order was cancelled.
    #[error("payment was declined")]
    Declined { order_id: OrderId },

    /// The gateway could not be reached; the order was cancelled.
    #[error("payment error: {0}")]
    Payment(#[source] PaymentError),

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutFailure {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Order placement input.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub shipping: ShippingAddress,
    pub payment_nonce: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub credits_to_redeem: i64,
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub quote: CheckoutQuote,
    pub payment_transaction_id: Option<String>,
}

/// Gateway webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `transaction.settled`.
    pub event: String,
    /// Our order id, echoed from the charge reference.
    pub reference: String,
    /// Gateway transaction id.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Checkout operations.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    gateway: &'a PaymentGateway,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, gateway: &'a PaymentGateway) -> Self {
        Self { pool, gateway }
    }

    /// Resolve an optional coupon code for `buyer`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutFailure::UnknownCoupon` or `OwnCoupon` when the code
    /// cannot be applied.
    pub async fn resolve_coupon(
        &self,
        buyer: UserId,
        code: Option<&str>,
    ) -> Result<Option<AppliedCoupon>, CheckoutFailure> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let code = CouponCode::parse(code)?;
        let coupon = CreatorRepository::new(self.pool)
            .find_coupon(&code)
            .await?
            .ok_or(CheckoutFailure::UnknownCoupon)?;
        if coupon.creator_id == buyer {
            return Err(CheckoutFailure::OwnCoupon);
        }
        Ok(Some(coupon))
    }

    /// Price the cart without reserving anything.
    ///
    /// Uses the price snapshots in the cart; placement re-prices from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutFailure` if the coupon or redemption is invalid.
    pub async fn quote(
        &self,
        buyer: UserId,
        cart: &Cart,
        coupon_code: Option<&str>,
        credits_to_redeem: i64,
    ) -> Result<CheckoutQuote, CheckoutFailure> {
        let coupon = self.resolve_coupon(buyer, coupon_code).await?;
        let balance = WalletRepository::new(self.pool).balance(buyer).await?;
        Ok(CheckoutQuote::compute(
            cart.subtotal(),
            coupon.as_ref(),
            credits_to_redeem,
            balance,
        )?)
    }

    /// Place an order for the cart and charge the payment nonce.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutFailure::Declined` when the payment fails (the order
    /// has then been cancelled), or another `CheckoutFailure` if the order
    /// could not be created.
    #[instrument(skip(self, cart, request), fields(buyer = %buyer))]
    pub async fn place_order(
        &self,
        buyer: UserId,
        cart: &Cart,
        request: &PlaceOrder,
    ) -> Result<PlacedOrder, CheckoutFailure> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        request
            .shipping
            .validate()
            .map_err(CheckoutFailure::InvalidShipping)?;
        let coupon = self
            .resolve_coupon(buyer, request.coupon_code.as_deref())
            .await?;

        let (order_id, quote) = self
            .reserve(buyer, cart, coupon.as_ref(), request)
            .await?;
        info!(%order_id, total = %quote.total, "Order reserved");

        if quote.total <= Decimal::ZERO {
            self.mark_paid(order_id, None).await?;
            return Ok(PlacedOrder {
                order_id,
                status: OrderStatus::Paid,
                quote,
                payment_transaction_id: None,
            });
        }

        match self
            .gateway
            .charge(quote.total, &request.payment_nonce, &order_id.to_string())
            .await
        {
            Ok(charge) => {
                self.mark_paid(order_id, Some(&charge.id)).await?;
                info!(%order_id, transaction_id = %charge.id, "Order paid");
                Ok(PlacedOrder {
                    order_id,
                    status: OrderStatus::Paid,
                    quote,
                    payment_transaction_id: Some(charge.id),
                })
            }
            Err(e) => {
                warn!(%order_id, error = %e, "Payment failed, compensating");
                if let Err(comp) = self.compensate(order_id).await {
                    error!(%order_id, error = %comp, "Compensation failed");
                }
                match e {
                    PaymentError::Declined { .. } => Err(CheckoutFailure::Declined { order_id }),
                    other => Err(CheckoutFailure::Payment(other)),
                }
            }
        }
    }

    /// Phase one: everything up to the gateway charge, in one transaction.
    async fn reserve(
        &self,
        buyer: UserId,
        cart: &Cart,
        coupon: Option<&AppliedCoupon>,
        request: &PlaceOrder,
    ) -> Result<(OrderId, CheckoutQuote), CheckoutFailure> {
        let mut wanted: BTreeMap<ProductId, i32> = BTreeMap::new();
        for line in cart.lines() {
            let qty = i32::try_from(line.quantity).unwrap_or(i32::MAX);
            *wanted.entry(line.product_id).or_insert(0) += qty;
        }
        let ids: Vec<ProductId> = wanted.keys().copied().collect();

        let mut tx = self.pool.begin().await?;

        let locked = orders::lock_products(&mut tx, &ids).await?;
        let mut items = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = locked
                .iter()
                .find(|p| p.id == line.product_id && p.is_active)
                .ok_or_else(|| CheckoutFailure::Unavailable {
                    title: line.title.clone(),
                })?;
            let requested = wanted.get(&product.id).copied().unwrap_or_default();
            if product.stock < requested {
                return Err(CheckoutFailure::OutOfStock {
                    title: product.title.clone(),
                    available: product.stock,
                });
            }
            items.push(NewOrderItem {
                product_id: product.id,
                title: product.title.clone(),
                size: line.size.clone(),
                unit_price: product.price,
                quantity: i32::try_from(line.quantity).unwrap_or(i32::MAX),
            });
        }

        let subtotal: Decimal = items
            .iter()
            .map(|i| round_cents(i.unit_price * Decimal::from(i.quantity)))
            .sum();
        let balance = wallet::lock_balance(&mut tx, buyer).await?;
        let quote =
            CheckoutQuote::compute(subtotal, coupon, request.credits_to_redeem, balance)?;

        for (product_id, qty) in &wanted {
            orders::adjust_stock(&mut tx, *product_id, -qty).await?;
        }
        let order_id = orders::insert_order(&mut tx, buyer, &quote, &request.shipping, &items).await?;

        if quote.credits_redeemed > 0 {
            let reference = format!("order:{order_id}");
            wallet::apply(
                &mut tx,
                buyer,
                &NewTransaction {
                    amount: quote.credit_discount,
                    credits: -quote.credits_redeemed,
                    kind: TransactionType::Redemption,
                    status: TransactionStatus::Completed,
                    reference: Some(&reference),
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok((order_id, quote))
    }

    /// Mark a pending order paid. Returns `false` if it was no longer pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn mark_paid(
        &self,
        order_id: OrderId,
        transaction_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::lock_order(&mut tx, order_id).await? else {
            return Err(RepositoryError::NotFound);
        };
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }
        orders::set_status(&mut tx, order_id, OrderStatus::Paid, transaction_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Undo a pending order: cancel it, restock its items and refund credits.
    ///
    /// Returns `false` (and changes nothing) if the order is not pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the compensation could not be written.
    pub async fn compensate(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::lock_order(&mut tx, order_id).await? else {
            return Err(RepositoryError::NotFound);
        };
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }

        orders::restock_items(&mut tx, order_id).await?;
        orders::set_status(&mut tx, order_id, OrderStatus::Cancelled, None).await?;

        if order.credits_redeemed > 0 {
            let reference = format!("order:{order_id}");
            wallet::apply(
                &mut tx,
                order.user_id,
                &NewTransaction {
                    amount: dollars_for_credits(order.credits_redeemed),
                    credits: order.credits_redeemed,
                    kind: TransactionType::Refund,
                    status: TransactionStatus::Completed,
                    reference: Some(&reference),
                },
            )
            .await?;
        }

        tx.commit().await?;
        info!(%order_id, "Order cancelled and compensated");
        Ok(true)
    }

    /// Apply a verified gateway webhook.
    ///
    /// Unknown events and references that are not order ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the order update fails.
    #[instrument(skip(self), fields(event = %event.event))]
    pub async fn handle_webhook(&self, event: &WebhookEvent) -> Result<(), RepositoryError> {
        let Ok(order_id) = event.reference.parse::<i64>().map(OrderId::new) else {
            info!(reference = %event.reference, "Ignoring webhook for non-order reference");
            return Ok(());
        };

        let result = match event.event.as_str() {
            "transaction.settled" => {
                self.mark_paid(order_id, event.transaction_id.as_deref())
                    .await
            }
            "transaction.failed" | "transaction.voided" => self.compensate(order_id).await,
            other => {
                info!(event = other, "Ignoring webhook event");
                return Ok(());
            }
        };

        match result {
            Ok(changed) => {
                info!(%order_id, changed, "Webhook applied");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                warn!(%order_id, "Webhook for unknown order");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
