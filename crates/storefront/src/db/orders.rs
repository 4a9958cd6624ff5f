//! Order persistence.
//!
//! Writes that must happen together (stock, order rows, credits) take a
//! `&mut PgConnection` so the checkout service can run them in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use solewave_core::checkout::CheckoutQuote;
use solewave_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, OrderSummary, ShippingAddress};

/// A product row locked for the duration of a checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
}

/// An order line ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub size: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Status and credit state needed to compensate an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderState {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub credits_redeemed: i64,
    pub order_total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    subtotal: Decimal,
    discount_amount: Decimal,
    credits_redeemed: i64,
    credit_discount: Decimal,
    order_total: Decimal,
    coupon_code: Option<String>,
    payment_transaction_id: Option<String>,
    shipping_name: String,
    shipping_address1: String,
    shipping_address2: Option<String>,
    shipping_city: String,
    shipping_region: String,
    shipping_postal_code: String,
    shipping_country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            credits_redeemed: self.credits_redeemed,
            credit_discount: self.credit_discount,
            order_total: self.order_total,
            coupon_code: self.coupon_code,
            payment_transaction_id: self.payment_transaction_id,
            shipping: ShippingAddress {
                name: self.shipping_name,
                address1: self.shipping_address1,
                address2: self.shipping_address2,
                city: self.shipping_city,
                region: self.shipping_region,
                postal_code: self.shipping_postal_code,
                country: self.shipping_country,
            },
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Lock product rows in id order to avoid deadlocks between concurrent checkouts.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<LockedProduct>, RepositoryError> {
    let raw: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
    let rows = sqlx::query_as::<_, LockedProduct>(
        r"
        SELECT id, title, price, stock, is_active
        FROM store.product
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(raw)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Adjust stock by `delta`. Fails with `Conflict` if stock would go negative.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on insufficient stock.
pub async fn adjust_stock(
    conn: &mut PgConnection,
    id: ProductId,
    delta: i32,
) -> Result<(), RepositoryError> {
    let updated = sqlx::query(
        r"
        UPDATE store.product
        SET stock = stock + $2, updated_at = NOW()
        WHERE id = $1 AND stock + $2 >= 0
        ",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "insufficient stock for product {id}"
        )));
    }
    Ok(())
}

/// Insert a `pending` order and its items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    quote: &CheckoutQuote,
    shipping: &ShippingAddress,
    items: &[NewOrderItem],
) -> Result<OrderId, RepositoryError> {
    let order_id: OrderId = sqlx::query_scalar(
        r"
        INSERT INTO store.order (
            user_id, status, subtotal, discount_amount, credits_redeemed, credit_discount,
            order_total, coupon_code, creator_id, commission_rate_at_purchase,
            commission_amount_at_purchase, shipping_name, shipping_address1,
            shipping_address2, shipping_city, shipping_region, shipping_postal_code,
            shipping_country
        )
        VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(quote.subtotal)
    .bind(quote.discount_amount)
    .bind(quote.credits_redeemed)
    .bind(quote.credit_discount)
    .bind(quote.total)
    .bind(quote.coupon_code.as_ref().map(ToString::to_string))
    .bind(quote.creator_id)
    .bind(quote.commission_rate)
    .bind(quote.commission_amount)
    .bind(&shipping.name)
    .bind(&shipping.address1)
    .bind(shipping.address2.as_deref())
    .bind(&shipping.city)
    .bind(&shipping.region)
    .bind(&shipping.postal_code)
    .bind(&shipping.country)
    .fetch_one(&mut *conn)
    .await?;

    for item in items {
        sqlx::query(
            r"
            INSERT INTO store.order_item (order_id, product_id, title, size, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.title)
        .bind(item.size.as_deref())
        .bind(item.unit_price)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }

    Ok(order_id)
}

/// Lock an order row for a status change.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<OrderState>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderState>(
        r"
        SELECT id, user_id, status, credits_redeemed, order_total
        FROM store.order
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Set the status of an order, optionally recording the gateway transaction id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
    payment_transaction_id: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE store.order
        SET status = $2,
            payment_transaction_id = COALESCE($3, payment_transaction_id),
            updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(status)
    .bind(payment_transaction_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Put the items of an order back on the shelf.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn restock_items(conn: &mut PgConnection, id: OrderId) -> Result<(), RepositoryError> {
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
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Order history for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.status, o.order_total, o.created_at,
                   COALESCE((SELECT SUM(quantity) FROM store.order_item WHERE order_id = o.id), 0)::BIGINT
                       AS item_count
            FROM store.order o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// A single order with items, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, subtotal, discount_amount, credits_redeemed,
                   credit_discount, order_total, coupon_code, payment_transaction_id,
                   shipping_name, shipping_address1, shipping_address2, shipping_city,
                   shipping_region, shipping_postal_code, shipping_country,
                   created_at, updated_at
            FROM store.order
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
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

        Ok(Some(row.into_order(items)))
    }
}
