//! Social follower verification review.

use sqlx::PgPool;

use solewave_core::credits::dollars_for_credits;
use solewave_core::tier::CreatorTier;
use solewave_core::{SocialVerificationId, TransactionType, UserId, VerificationStatus};

use super::RepositoryError;
use super::wallet::{self, WalletEntry};
use crate::models::SocialVerification;

const SELECT_VERIFICATION: &str = r"
    SELECT r.id, r.user_id, u.email, p.display_name, r.platform, r.username,
           r.follower_count, r.status, r.reviewed_by, r.review_note,
           r.created_at, r.reviewed_at
    FROM store.social_verification_request r
    JOIN store.user u ON u.id = r.user_id
    JOIN store.profile p ON p.user_id = r.user_id
";

/// Outcome of an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    /// The creator's tier after the review; `None` for non-creators.
    pub tier: Option<CreatorTier>,
    pub bonus_credits: i64,
    pub new_balance: i64,
}

/// Repository for social verification requests.
pub struct SocialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SocialRepository<'a> {
    /// Create a new social verification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Requests, oldest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<SocialVerification>, RepositoryError> {
        let rows = sqlx::query_as::<_, SocialVerification>(&format!(
            "{SELECT_VERIFICATION} WHERE ($1::TEXT IS NULL OR r.status::TEXT = $1) \
             ORDER BY r.created_at, r.id"
        ))
        .bind(status.map(VerificationStatus::as_str))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get one request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: SocialVerificationId,
    ) -> Result<Option<SocialVerification>, RepositoryError> {
        let row = sqlx::query_as::<_, SocialVerification>(&format!(
            "{SELECT_VERIFICATION} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Approve a pending request in one transaction.
    ///
    /// Stamps the review, stores the verified follower count on the profile,
    /// raises a creator's tier to `payout_tier` if that is higher, and grants
    /// the tier's verification bonus.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    /// Returns `RepositoryError::Conflict` if it was already reviewed.
    pub async fn approve(
        &self,
        id: SocialVerificationId,
        reviewer: UserId,
        payout_tier: CreatorTier,
    ) -> Result<Approval, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let request: Option<(UserId, i64, VerificationStatus)> = sqlx::query_as(
            r"
            SELECT user_id, follower_count, status
            FROM store.social_verification_request
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((user_id, follower_count, status)) = request else {
            return Err(RepositoryError::NotFound);
        };
        if status != VerificationStatus::Pending {
            return Err(RepositoryError::Conflict(format!(
                "verification request is already {status}"
            )));
        }

        sqlx::query(
            r"
            UPDATE store.social_verification_request
            SET status = $2, reviewed_by = $3, reviewed_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(VerificationStatus::Approved)
        .bind(reviewer)
        .execute(&mut *tx)
        .await?;

        let (is_creator, current): (bool, Option<CreatorTier>) = sqlx::query_as(
            "SELECT is_creator, creator_tier FROM store.profile WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let tier = is_creator.then(|| {
            current.map_or(payout_tier, |current| current.upgraded_to(payout_tier))
        });

        sqlx::query(
            r"
            UPDATE store.profile
            SET follower_count = $2,
                creator_tier = COALESCE($3, creator_tier),
                commission_rate = COALESCE($4, commission_rate),
                updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(follower_count)
        .bind(tier)
        .bind(tier.map(CreatorTier::commission_rate))
        .execute(&mut *tx)
        .await?;

        let bonus_credits = payout_tier.verification_bonus_credits();
        let reference = format!("verification:{id}");
        let new_balance = wallet::apply(
            &mut tx,
            user_id,
            &WalletEntry {
                amount: dollars_for_credits(bonus_credits),
                credits: bonus_credits,
                kind: TransactionType::VerificationBonus,
                reference: Some(&reference),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(Approval {
            tier,
            bonus_credits,
            new_balance,
        })
    }

    /// Reject a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    /// Returns `RepositoryError::Conflict` if it was already reviewed.
    pub async fn reject(
        &self,
        id: SocialVerificationId,
        reviewer: UserId,
        note: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE store.social_verification_request
            SET status = $2, reviewed_by = $3, review_note = $4, reviewed_at = NOW()
            WHERE id = $1 AND status = $5
            ",
        )
        .bind(id)
        .bind(VerificationStatus::Rejected)
        .bind(reviewer)
        .bind(note)
        .bind(VerificationStatus::Pending)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(());
        }

        match self.get(id).await? {
            None => Err(RepositoryError::NotFound),
            Some(request) => Err(RepositoryError::Conflict(format!(
                "verification request is already {}",
                request.status
            ))),
        }
    }
}
