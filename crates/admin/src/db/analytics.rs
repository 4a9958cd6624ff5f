//! Dashboard queries.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use solewave_core::Role;
use solewave_core::stock::LOW_STOCK_THRESHOLD;

use super::{RepositoryError, sale_statuses};
use crate::models::analytics::{average_order_value, fill_days};
use crate::models::{Dashboard, LowStockProduct, RevenueDay, StatusCount, TopProduct};

/// Days covered by the revenue series.
pub const REVENUE_DAYS: u32 = 30;

const TOP_PRODUCTS: i64 = 5;

/// Repository for dashboard figures.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute every dashboard figure from current data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn dashboard(&self) -> Result<Dashboard, RepositoryError> {
        let sales = sale_statuses();

        let (revenue, order_count, outstanding_commission): (Decimal, i64, Decimal) =
            sqlx::query_as(
                r"
                SELECT COALESCE(SUM(order_total), 0),
                       COUNT(*),
                       COALESCE(SUM(commission_amount_at_purchase)
                           FILTER (WHERE creator_id IS NOT NULL AND NOT commission_paid), 0)
                FROM store.order
                WHERE status::TEXT = ANY($1)
                ",
            )
            .bind(&sales)
            .fetch_one(self.pool)
            .await?;

        let (customer_count, creator_count): (i64, i64) = sqlx::query_as(
            r"
            SELECT COUNT(*) FILTER (WHERE role = $1),
                   COUNT(*) FILTER (WHERE is_creator)
            FROM store.profile
            ",
        )
        .bind(Role::Customer)
        .fetch_one(self.pool)
        .await?;

        let pending_verifications: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM store.social_verification_request WHERE status = 'pending'",
        )
        .fetch_one(self.pool)
        .await?;

        let low_stock = sqlx::query_as::<_, LowStockProduct>(
            r"
            SELECT id, slug, title, stock
            FROM store.product
            WHERE is_active AND stock <= $1
            ORDER BY stock, title
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(self.pool)
        .await?;

        let status_breakdown = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM store.order GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        let days = sqlx::query_as::<_, RevenueDay>(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day,
                   SUM(order_total) AS revenue,
                   COUNT(*) AS orders
            FROM store.order
            WHERE status::TEXT = ANY($1)
              AND created_at >= NOW() - make_interval(days => $2)
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(&sales)
        .bind(i32::try_from(REVENUE_DAYS).unwrap_or(i32::MAX))
        .fetch_all(self.pool)
        .await?;
        let revenue_by_day = fill_days(&days, Utc::now().date_naive(), REVENUE_DAYS);

        let top_products = sqlx::query_as::<_, TopProduct>(
            r"
            SELECT i.product_id, p.title,
                   SUM(i.quantity)::BIGINT AS units,
                   SUM(i.unit_price * i.quantity) AS revenue
            FROM store.order_item i
            JOIN store.order o ON o.id = i.order_id
            JOIN store.product p ON p.id = i.product_id
            WHERE o.status::TEXT = ANY($1)
            GROUP BY i.product_id, p.title
            ORDER BY units DESC, revenue DESC
            LIMIT $2
            ",
        )
        .bind(&sales)
        .bind(TOP_PRODUCTS)
        .fetch_all(self.pool)
        .await?;

        Ok(Dashboard {
            revenue,
            order_count,
            average_order_value: average_order_value(revenue, order_count),
            customer_count,
            creator_count,
            pending_verifications,
            low_stock,
            status_breakdown,
            revenue_by_day,
            top_products,
            outstanding_commission,
        })
    }
}
