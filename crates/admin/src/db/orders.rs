//! Order reads and guarded status changes.

use sqlx::PgPool;

use solewave_core::credits::dollars_for_credits;
use solewave_core::{OrderId, OrderStatus, TransactionType, UserId};

use super::RepositoryError;
use super::wallet::{self, WalletEntry};
use crate::models::{OrderDetail, OrderItem, OrderQuery, OrderSummary, Page};

#[derive(Debug, sqlx::FromRow)]
struct LockedOrder {
    status: OrderStatus,
    user_id: UserId,
    credits_redeemed: i64,
}

/// Outcome of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Whether the items went back into stock.
    pub restocked: bool,
    /// Credits returned to the customer.
    pub credits_refunded: i64,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: OrderQuery) -> Result<Page<OrderSummary>, RepositoryError> {
        let paging = query.paging();
        let status = query.status.map(OrderStatus::as_str);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM store.order WHERE ($1::TEXT IS NULL OR status::TEXT = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.user_id, u.email AS customer_email, o.status, o.order_total,
                   o.coupon_code, o.creator_id,
                   COALESCE((SELECT SUM(quantity) FROM store.order_item WHERE order_id = o.id), 0)::BIGINT
                       AS item_count,
                   o.created_at
            FROM store.order o
            JOIN store.user u ON u.id = o.user_id
            WHERE ($1::TEXT IS NULL OR o.status::TEXT = $1)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(status)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, paging, total))
    }

    /// A single order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderDetail>(
            r"
            SELECT o.id, o.user_id, u.email AS customer_email, o.status, o.subtotal,
                   o.discount_amount, o.credits_redeemed, o.credit_discount, o.order_total,
                   o.coupon_code, o.creator_id, o.commission_rate_at_purchase,
                   o.commission_amount_at_purchase, o.commission_paid, o.payment_transaction_id,
                   o.shipping_name, o.shipping_address1, o.shipping_address2, o.shipping_city,
                   o.shipping_region, o.shipping_postal_code, o.shipping_country,
                   o.created_at, o.updated_at
            FROM store.order o
            JOIN store.user u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(mut order) = row else {
            return Ok(None);
        };

        order.items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, product_id, title, size, unit_price, quantity
            FROM store.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(order))
    }

    /// Move an order to `next` if the transition is allowed.
    ///
    /// Cancelling or refunding an order that has not shipped puts its items
    /// back into stock. Cancelling or refunding returns redeemed credits.
    /// Everything happens in one transaction with the order row locked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, LockedOrder>(
            "SELECT status, user_id, credits_redeemed FROM store.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.status.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {} to {next}",
                current.status
            )));
        }

        sqlx::query("UPDATE store.order SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        let reversing = matches!(next, OrderStatus::Cancelled | OrderStatus::Refunded);
        let restocked = reversing && current.status.restocks_on_cancel();
        if restocked {
            sqlx::query(
                r"
                UPDATE store.product p
                SET stock = p.stock + i.quantity, updated_at = NOW()
                FROM (
                    SELECT product_id, SUM(quantity)::INTEGER AS quantity
                    FROM store.order_item
                    WHERE order_id = $1
                    GROUP BY product_id
                ) i
                WHERE p.id = i.product_id
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let credits_refunded = if reversing && current.credits_redeemed > 0 {
            let reference = format!("order:{id}");
            wallet::apply(
                &mut tx,
                current.user_id,
                &WalletEntry {
                    amount: dollars_for_credits(current.credits_redeemed),
                    credits: current.credits_redeemed,
                    kind: TransactionType::Refund,
                    reference: Some(&reference),
                },
            )
            .await?;
            current.credits_redeemed
        } else {
            0
        };

        tx.commit().await?;

        Ok(StatusChange {
            from: current.status,
            to: next,
            restocked,
            credits_refunded,
        })
    }
}
