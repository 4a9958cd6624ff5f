//! Back-office dashboard figures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use solewave_core::{OrderStatus, ProductId};

/// Everything `GET /api/dashboard` returns.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Sum of sale-status order totals.
    pub revenue: Decimal,
    /// Number of sale-status orders.
    pub order_count: i64,
    pub average_order_value: Decimal,
    pub customer_count: i64,
    pub creator_count: i64,
    pub pending_verifications: i64,
    pub low_stock: Vec<LowStockProduct>,
    pub status_breakdown: Vec<StatusCount>,
    /// One entry per day for the last 30 days, oldest first, zero-filled.
    pub revenue_by_day: Vec<RevenueDay>,
    pub top_products: Vec<TopProduct>,
    /// Commission on sale-status orders not yet paid out.
    pub outstanding_commission: Decimal,
}

/// Active product at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub stock: i32,
}

/// Orders per status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Sale revenue on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RevenueDay {
    pub day: NaiveDate,
    pub revenue: Decimal,
    pub orders: i64,
}

/// Best seller by units over sale-status orders.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub title: String,
    pub units: i64,
    pub revenue: Decimal,
}

/// Average order value rounded to cents, zero when there are no orders.
#[must_use]
pub fn average_order_value(revenue: Decimal, orders: i64) -> Decimal {
    if orders <= 0 {
        return Decimal::ZERO;
    }
    solewave_core::round_cents(revenue / Decimal::from(orders))
}

/// Fill the days missing from `rows` with zeros so the series covers
/// `days` consecutive days ending at `today`.
#[must_use]
pub fn fill_days(rows: &[RevenueDay], today: NaiveDate, days: u32) -> Vec<RevenueDay> {
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(chrono::Days::new(u64::from(back))))
        .map(|day| {
            rows.iter().find(|r| r.day == day).cloned().unwrap_or(RevenueDay {
                day,
                revenue: Decimal::ZERO,
                orders: 0,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_average_order_value() {
        assert_eq!(average_order_value(Decimal::ZERO, 0), Decimal::ZERO);
        assert_eq!(
            average_order_value(Decimal::new(10_000, 2), 3),
            Decimal::new(3_333, 2)
        );
    }

    #[test]
    fn test_fill_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let rows = vec![RevenueDay {
            day: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            revenue: Decimal::new(25_000, 2),
            orders: 2,
        }];
        let series = fill_days(&rows, today, 30);
        assert_eq!(series.len(), 30);
        assert_eq!(series.last().unwrap().day, today);
        assert_eq!(series.first().unwrap().day, NaiveDate::from_ymd_opt(2026, 2, 9).unwrap());
        assert_eq!(series.get(28).unwrap().orders, 2);
        assert_eq!(series.last().unwrap().revenue, Decimal::ZERO);
    }
}
