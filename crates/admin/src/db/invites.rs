//! Creator invitations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use solewave_core::coupon::CouponCode;
use solewave_core::tier::CreatorTier;
use solewave_core::{CreatorInviteId, Email, InviteStatus, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::CreatorInvite;

const INVITE_COLUMNS: &str =
    "id, email, tier, coupon_code, status, invited_by, created_at, expires_at, accepted_at";

/// Fields of a new invitation.
#[derive(Debug)]
pub struct NewInvite<'r> {
    pub email: &'r Email,
    pub tier: CreatorTier,
    pub coupon_code: &'r CouponCode,
    pub token: &'r str,
    pub expires_at: DateTime<Utc>,
    pub invited_by: UserId,
}

/// Repository for creator invite operations.
pub struct InviteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InviteRepository<'a> {
    /// Create a new invite repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a token collision.
    pub async fn create(&self, invite: &NewInvite<'_>) -> Result<CreatorInvite, RepositoryError> {
        let row = sqlx::query_as::<_, CreatorInvite>(&format!(
            r"
            INSERT INTO store.creator_invite
                (email, tier, coupon_code, invite_token, expires_at, invited_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVITE_COLUMNS}
            "
        ))
        .bind(invite.email.as_str())
        .bind(invite.tier)
        .bind(invite.coupon_code.as_str())
        .bind(invite.token)
        .bind(invite.expires_at)
        .bind(invite.invited_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "invite token"))?;
        Ok(row)
    }

    /// Invitations, newest first, optionally filtered by status.
    ///
    /// Pending invitations past their expiry are marked expired first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<InviteStatus>,
    ) -> Result<Vec<CreatorInvite>, RepositoryError> {
        let expired = self.expire_stale().await?;
        if expired > 0 {
            tracing::info!(count = expired, "Marked stale creator invites expired");
        }

        let rows = sqlx::query_as::<_, CreatorInvite>(&format!(
            r"
            SELECT {INVITE_COLUMNS}
            FROM store.creator_invite
            WHERE ($1::TEXT IS NULL OR status::TEXT = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status.map(InviteStatus::as_str))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Mark pending invitations past their expiry as expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn expire_stale(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.creator_invite
            SET status = $1
            WHERE status = $2 AND expires_at <= NOW()
            ",
        )
        .bind(InviteStatus::Expired)
        .bind(InviteStatus::Pending)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Revoke a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the invite does not exist.
    /// Returns `RepositoryError::Conflict` if it is no longer pending.
    pub async fn revoke(&self, id: CreatorInviteId) -> Result<CreatorInvite, RepositoryError> {
        let row = sqlx::query_as::<_, CreatorInvite>(&format!(
            r"
            UPDATE store.creator_invite
            SET status = $2
            WHERE id = $1 AND status = $3
            RETURNING {INVITE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(InviteStatus::Revoked)
        .bind(InviteStatus::Pending)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row);
        }

        let status: Option<InviteStatus> =
            sqlx::query_scalar("SELECT status FROM store.creator_invite WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        match status {
            None => Err(RepositoryError::NotFound),
            Some(status) => Err(RepositoryError::Conflict(format!(
                "invite is already {status}"
            ))),
        }
    }

    /// Whether `code` is held by a profile or promised by a pending invite.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn coupon_taken(&self, code: &CouponCode) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (SELECT 1 FROM store.profile WHERE UPPER(coupon_code) = $1)
                OR EXISTS (
                    SELECT 1 FROM store.creator_invite
                    WHERE UPPER(coupon_code) = $1 AND status = $2 AND expires_at > NOW()
                )
            ",
        )
        .bind(code.as_str())
        .bind(InviteStatus::Pending)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }
}
