//! Creator program administration: terms, coupons and commission payouts.

use rust_decimal::Decimal;
use sqlx::PgPool;

use solewave_core::coupon::CouponCode;
use solewave_core::credits::credits_for_dollars;
use solewave_core::tier::CreatorTier;
use solewave_core::{TransactionType, UserId};

use super::users::PROFILE_COLUMNS;
use super::wallet::{self, WalletEntry};
use super::{RepositoryError, conflict_on_unique, sale_statuses};
use crate::models::{CreatorSummary, Payout, Profile};

/// What to do with a creator's coupon code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponChange {
    /// Leave the code as it is.
    Keep,
    /// Remove the code; the coupon stops working at checkout.
    Clear,
    /// Replace the code.
    Set(CouponCode),
}

/// Repository for creator program operations.
pub struct CreatorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CreatorRepository<'a> {
    /// Create a new creator repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every creator with sales attributed to them, biggest sellers first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CreatorSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CreatorSummary>(
            r"
            SELECT p.user_id, u.email, p.display_name, p.creator_tier, p.commission_rate,
                   p.coupon_code, p.coupon_discount_percent, p.credits, p.follower_count,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.order_total), 0) AS gross_sales,
                   COALESCE(SUM(o.commission_amount_at_purchase), 0) AS commission_earned,
                   COALESCE(SUM(o.commission_amount_at_purchase)
                       FILTER (WHERE NOT o.commission_paid), 0) AS commission_unpaid
            FROM store.profile p
            JOIN store.user u ON u.id = p.user_id
            LEFT JOIN store.order o
                ON o.creator_id = p.user_id AND o.status::TEXT = ANY($1)
            WHERE p.is_creator
            GROUP BY p.user_id, u.email
            ORDER BY gross_sales DESC, p.user_id
            ",
        )
        .bind(sale_statuses())
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Move a creator to `tier`, keeping the commission rate in step.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not a creator.
    pub async fn set_tier(
        &self,
        user_id: UserId,
        tier: CreatorTier,
    ) -> Result<Profile, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE store.profile
            SET creator_tier = $2, commission_rate = $3, updated_at = NOW()
            WHERE user_id = $1 AND is_creator
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(tier)
        .bind(tier.commission_rate())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(profile)
    }

    /// Change a creator's coupon code and/or its discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not a creator.
    /// Returns `RepositoryError::Conflict` if the code belongs to someone else.
    pub async fn set_coupon(
        &self,
        user_id: UserId,
        code: &CouponChange,
        discount_percent: Option<i32>,
    ) -> Result<Profile, RepositoryError> {
        let (replace, new_code) = match code {
            CouponChange::Keep => (false, None),
            CouponChange::Clear => (true, None),
            CouponChange::Set(code) => (true, Some(code.as_str())),
        };

        let profile = sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE store.profile
            SET coupon_code = CASE WHEN $2 THEN $3 ELSE coupon_code END,
                coupon_discount_percent = COALESCE($4, coupon_discount_percent),
                updated_at = NOW()
            WHERE user_id = $1 AND is_creator
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(replace)
        .bind(new_code)
        .bind(discount_percent)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))?
        .ok_or(RepositoryError::NotFound)?;
        Ok(profile)
    }

    /// Convert all unpaid commission on sale-status orders into credits.
    ///
    /// The orders are locked, marked paid and the credits recorded in one
    /// transaction, so a concurrent payout cannot pay the same order twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not a creator.
    /// Returns `RepositoryError::Conflict` if there is nothing to pay.
    pub async fn payout(&self, user_id: UserId) -> Result<Payout, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let is_creator: Option<bool> = sqlx::query_scalar(
            "SELECT is_creator FROM store.profile WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if is_creator != Some(true) {
            return Err(RepositoryError::NotFound);
        }

        let unpaid: Vec<(i64, Decimal)> = sqlx::query_as(
            r"
            SELECT id, commission_amount_at_purchase
            FROM store.order
            WHERE creator_id = $1
              AND NOT commission_paid
              AND commission_amount_at_purchase > 0
              AND status::TEXT = ANY($2)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(sale_statuses())
        .fetch_all(&mut *tx)
        .await?;

        let commission_total: Decimal = unpaid.iter().map(|(_, amount)| *amount).sum();
        let credits = credits_for_dollars(commission_total);
        if unpaid.is_empty() || credits <= 0 {
            return Err(RepositoryError::Conflict(
                "no unpaid commission".to_string(),
            ));
        }

        let ids: Vec<i64> = unpaid.iter().map(|(id, _)| *id).collect();
        let marked = sqlx::query(
            "UPDATE store.order SET commission_paid = TRUE, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        let reference = payout_reference(&ids);
        let new_balance = wallet::apply(
            &mut tx,
            user_id,
            &WalletEntry {
                amount: commission_total,
                credits,
                kind: TransactionType::CommissionPayout,
                reference: Some(&reference),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(Payout {
            orders_paid: marked.rows_affected(),
            commission_total,
            credits,
            new_balance,
        })
    }
}

/// Wallet reference naming the orders a payout settled, e.g. `payout:orders:12,15`.
fn payout_reference(order_ids: &[i64]) -> String {
    let ids: Vec<String> = order_ids.iter().map(ToString::to_string).collect();
    format!("payout:orders:{}", ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_reference_lists_orders() {
        assert_eq!(payout_reference(&[12, 15, 19]), "payout:orders:12,15,19");
        assert_eq!(payout_reference(&[7]), "payout:orders:7");
    }
}
