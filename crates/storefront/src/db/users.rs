//! User and profile repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use solewave_core::tier::CreatorTier;
use solewave_core::{Email, Role, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::{Profile, User};

/// Columns selected for a [`Profile`].
pub(crate) const PROFILE_COLUMNS: &str = "user_id, display_name, avatar_url, role, is_creator, \
     creator_tier, commission_rate, coupon_code, coupon_discount_percent, credits, \
     follower_count, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: UserId::new(row.id),
            email,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    id: i64,
    email: String,
    created_at: DateTime<Utc>,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    user_id: i64,
    display_name: String,
    avatar_url: Option<String>,
    role: Role,
    is_creator: bool,
    creator_tier: Option<CreatorTier>,
    commission_rate: Option<Decimal>,
    coupon_code: Option<String>,
    coupon_discount_percent: i32,
    credits: i64,
    follower_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            role: row.role,
            is_creator: row.is_creator,
            creator_tier: row.creator_tier,
            commission_rate: row.commission_rate,
            coupon_code: row.coupon_code,
            coupon_discount_percent: row.coupon_discount_percent,
            credits: row.credits,
            follower_count: row.follower_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, created_at FROM store.user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user and their password hash for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            "SELECT id, email, created_at, password_hash FROM store.user WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = User::try_from(UserRow {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        })?;
        Ok(Some((user, row.password_hash)))
    }

    /// Create a user and their `customer` profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        display_name: &str,
    ) -> Result<(User, Profile), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user: User = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO store.user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, created_at
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?
        .try_into()?;

        let profile = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO store.profile (user_id, display_name) VALUES ($1, $2) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user.id)
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, profile.into()))
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM store.profile WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Change the display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update_display_name(
        &self,
        user_id: UserId,
        display_name: &str,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE store.profile SET display_name = $2, updated_at = NOW() \
             WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(display_name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Point the profile at a new avatar URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update_avatar(
        &self,
        user_id: UserId,
        avatar_url: &str,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE store.profile SET avatar_url = $2, updated_at = NOW() \
             WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(avatar_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
