//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solewave_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// Shipping destination entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns the name of the first blank required field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [
            ("name", &self.name),
            ("address1", &self.address1),
            ("city", &self.city),
            ("region", &self.region),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((field, _)) => Err(*field),
            None => Ok(()),
        }
    }
}

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub credits_redeemed: i64,
    pub credit_discount: Decimal,
    pub order_total: Decimal,
    pub coupon_code: Option<String>,
    pub payment_transaction_id: Option<String>,
    pub shipping: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

/// Order history row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub order_total: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Jay Ortiz".to_string(),
            address1: "12 Canal St".to_string(),
            address2: None,
            city: "New York".to_string(),
            region: "NY".to_string(),
            postal_code: "10013".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn test_shipping_validation() {
        assert_eq!(address().validate(), Ok(()));

        let mut missing = address();
        missing.city = "  ".to_string();
        assert_eq!(missing.validate(), Err("city"));
    }
}
