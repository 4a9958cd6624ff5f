//! Order views for fulfilment and support.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solewave_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::{PageQuery, Paging};

/// `GET /api/orders` query.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderQuery {
    /// Normalized paging.
    #[must_use]
    pub fn paging(self) -> Paging {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .into()
    }
}

/// Order list row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: String,
    pub status: OrderStatus,
    pub order_total: Decimal,
    pub coupon_code: Option<String>,
    pub creator_id: Option<UserId>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Full order including pricing and commission snapshots.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderDetail {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub credits_redeemed: i64,
    pub credit_discount: Decimal,
    pub order_total: Decimal,
    pub coupon_code: Option<String>,
    pub creator_id: Option<UserId>,
    pub commission_rate_at_purchase: Option<Decimal>,
    pub commission_amount_at_purchase: Decimal,
    pub commission_paid: bool,
    pub payment_transaction_id: Option<String>,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub shipping_city: String,
    pub shipping_region: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

/// A purchased product snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub title: String,
    pub size: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}
