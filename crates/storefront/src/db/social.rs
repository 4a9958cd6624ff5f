//! Social verification requests submitted by creators.

use sqlx::PgPool;

use solewave_core::{SocialPlatform, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::creator::SocialVerification;

const COLUMNS: &str = "id, user_id, platform, username, follower_count, status, review_note, \
     created_at, reviewed_at";

/// Repository for a creator's own verification requests.
pub struct SocialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SocialRepository<'a> {
    /// Create a new social verification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All requests by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SocialVerification>, RepositoryError> {
        let rows = sqlx::query_as::<_, SocialVerification>(&format!(
            "SELECT {COLUMNS} FROM store.social_verification_request \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Submit a new pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a request for this platform is
    /// already pending.
    pub async fn create(
        &self,
        user_id: UserId,
        platform: SocialPlatform,
        username: &str,
        follower_count: i64,
    ) -> Result<SocialVerification, RepositoryError> {
        let row = sqlx::query_as::<_, SocialVerification>(&format!(
            "INSERT INTO store.social_verification_request \
             (user_id, platform, username, follower_count) VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(platform)
        .bind(username)
        .bind(follower_count)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "pending verification for this platform"))?;
        Ok(row)
    }
}
