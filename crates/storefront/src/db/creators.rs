//! Creator program queries: coupon lookup, invites, sales stats.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use solewave_core::checkout::AppliedCoupon;
use solewave_core::coupon::{CouponCode, clamp_discount_percent};
use solewave_core::tier::CreatorTier;
use solewave_core::{CreatorInviteId, Email, InviteStatus, OrderStatus, Role, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::creator::{CreatorInvite, CreatorOrder, CreatorStats};

#[derive(Debug, sqlx::FromRow)]
struct CouponOwnerRow {
    user_id: UserId,
    coupon_code: String,
    coupon_discount_percent: i32,
    creator_tier: Option<CreatorTier>,
}

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    id: CreatorInviteId,
    email: String,
    tier: CreatorTier,
    coupon_code: String,
    status: InviteStatus,
    expires_at: DateTime<Utc>,
}

impl TryFrom<InviteRow> for CreatorInvite {
    type Error = RepositoryError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid invite email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            email,
            tier: row.tier,
            coupon_code: row.coupon_code,
            status: row.status,
            expires_at: row.expires_at,
        })
    }
}

/// Order statuses whose commission counts toward a creator's earnings.
pub(crate) fn sale_statuses() -> Vec<&'static str> {
    OrderStatus::SALES.iter().map(|s| s.as_str()).collect()
}

/// Repository for creator program data.
pub struct CreatorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CreatorRepository<'a> {
    /// Create a new creator repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a coupon code to its active creator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored code no longer parses.
    pub async fn find_coupon(
        &self,
        code: &CouponCode,
    ) -> Result<Option<AppliedCoupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponOwnerRow>(
            r"
            SELECT user_id, coupon_code, coupon_discount_percent, creator_tier
            FROM store.profile
            WHERE UPPER(coupon_code) = $1 AND is_creator
            ",
        )
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let code = CouponCode::parse(&row.coupon_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon code in database: {e}"))
        })?;

        Ok(Some(AppliedCoupon {
            code,
            discount_percent: clamp_discount_percent(row.coupon_discount_percent),
            creator_id: row.user_id,
            creator_tier: row.creator_tier.unwrap_or_default(),
        }))
    }

    /// Look up an invite by its token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_invite_by_token(
        &self,
        token: &str,
    ) -> Result<Option<CreatorInvite>, RepositoryError> {
        let row = sqlx::query_as::<_, InviteRow>(
            r"
            SELECT id, email, tier, coupon_code, status, expires_at
            FROM store.creator_invite
            WHERE invite_token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Turn `user_id` into a creator using the terms of `invite`.
    ///
    /// The invite is re-checked under a row lock so two concurrent accepts
    /// cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the invite is no longer pending or
    /// its coupon code is taken.
    pub async fn accept_invite(
        &self,
        invite: &CreatorInvite,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, InviteStatus>(
            "SELECT status FROM store.creator_invite WHERE id = $1 FOR UPDATE",
        )
        .bind(invite.id)
        .fetch_one(&mut *tx)
        .await?;
        if status != InviteStatus::Pending {
            return Err(RepositoryError::Conflict(format!("invite is {status}")));
        }

        sqlx::query(
            r"
            UPDATE store.profile
            SET role = CASE WHEN role = $5 THEN role ELSE $2 END,
                is_creator = TRUE,
                creator_tier = $3,
                commission_rate = $4,
                coupon_code = $6,
                updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(Role::Creator)
        .bind(invite.tier)
        .bind(invite.tier.commission_rate())
        .bind(Role::Admin)
        .bind(&invite.coupon_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))?;

        sqlx::query(
            r"
            UPDATE store.creator_invite
            SET status = 'accepted', accepted_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(invite.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Sales stats over sale-status orders placed with the creator's coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, creator_id: UserId) -> Result<CreatorStats, RepositoryError> {
        let stats = sqlx::query_as::<_, CreatorStats>(
            r"
            SELECT COUNT(*) AS order_count,
                   COALESCE(SUM(order_total), 0) AS gross_sales,
                   COALESCE(SUM(commission_amount_at_purchase), 0) AS commission_earned,
                   COALESCE(SUM(commission_amount_at_purchase) FILTER (WHERE NOT commission_paid), 0)
                       AS commission_unpaid
            FROM store.order
            WHERE creator_id = $1 AND status::TEXT = ANY($2)
            ",
        )
        .bind(creator_id)
        .bind(sale_statuses())
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }

    /// Orders placed with the creator's coupon, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders(&self, creator_id: UserId) -> Result<Vec<CreatorOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, CreatorOrder>(
            r"
            SELECT id, created_at, status, order_total,
                   commission_amount_at_purchase AS commission, commission_paid
            FROM store.order
            WHERE creator_id = $1
            ORDER BY created_at DESC
            LIMIT 200
            ",
        )
        .bind(creator_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Change the creator's coupon code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another creator owns the code.
    pub async fn set_coupon_code(
        &self,
        creator_id: UserId,
        code: &CouponCode,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE store.profile
            SET coupon_code = $2, updated_at = NOW()
            WHERE user_id = $1 AND is_creator
            ",
        )
        .bind(creator_id)
        .bind(code.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
