//! User, profile and role repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use solewave_core::coupon::CouponCode;
use solewave_core::tier::CreatorTier;
use solewave_core::{Email, Role, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{CurrentAdmin, Page, Profile, UserFilter, UserSummary};

/// Columns selected for a [`Profile`].
pub(crate) const PROFILE_COLUMNS: &str = "user_id, display_name, avatar_url, role, is_creator, \
     creator_tier, commission_rate, coupon_code, coupon_discount_percent, credits, \
     follower_count, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct LoginRow {
    id: UserId,
    email: String,
    password_hash: String,
    display_name: String,
    role: Role,
}

/// A user with the password hash and role needed to check an admin login.
#[derive(Debug)]
pub struct LoginCandidate {
    pub admin: CurrentAdmin,
    pub password_hash: String,
    pub role: Role,
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

    /// Look up login data by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_login(&self, email: &Email) -> Result<Option<LoginCandidate>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginRow>(
            r"
            SELECT u.id, u.email, u.password_hash, p.display_name, p.role
            FROM store.user u
            JOIN store.profile p ON p.user_id = u.id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Some(LoginCandidate {
            admin: CurrentAdmin {
                id: row.id,
                email,
                display_name: row.display_name,
            },
            password_hash: row.password_hash,
            role: row.role,
        }))
    }

    /// Current role of a user, `None` if the account is gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn role(&self, user_id: UserId) -> Result<Option<Role>, RepositoryError> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM store.profile WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(role)
    }

    /// Users joined with their profile, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &UserFilter) -> Result<Page<UserSummary>, RepositoryError> {
        let paging = filter.paging();
        let role = filter.role.map(Role::as_str);
        let pattern = filter.pattern();

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM store.user u
            JOIN store.profile p ON p.user_id = u.id
            WHERE ($1::TEXT IS NULL OR p.role::TEXT = $1)
              AND ($2::TEXT IS NULL OR u.email ILIKE $2 OR p.display_name ILIKE $2)
            ",
        )
        .bind(role)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, UserSummary>(
            r"
            SELECT u.id, u.email, p.display_name, p.role, p.is_creator, p.creator_tier,
                   p.coupon_code, p.credits, p.follower_count, u.created_at
            FROM store.user u
            JOIN store.profile p ON p.user_id = u.id
            WHERE ($1::TEXT IS NULL OR p.role::TEXT = $1)
              AND ($2::TEXT IS NULL OR u.email ILIKE $2 OR p.display_name ILIKE $2)
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(role)
        .bind(pattern.as_deref())
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, paging, total))
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM store.profile WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Change a user's role.
    ///
    /// Becoming a `creator` switches the creator program on, starting at the
    /// `Rising` tier unless a tier is already set, and stores `coupon` when
    /// given. Becoming a `customer` switches it off. Becoming an `admin`
    /// leaves creator program state as it is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Conflict` if the coupon code is taken.
    pub async fn set_role(
        &self,
        user_id: UserId,
        role: Role,
        coupon: Option<&CouponCode>,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE store.profile
            SET role = $2,
                is_creator = CASE
                    WHEN $2 = 'creator'::store.user_role THEN TRUE
                    WHEN $2 = 'customer'::store.user_role THEN FALSE
                    ELSE is_creator
                END,
                creator_tier = CASE
                    WHEN $2 = 'creator'::store.user_role THEN COALESCE(creator_tier, $3)
                    ELSE creator_tier
                END,
                commission_rate = CASE
                    WHEN $2 = 'creator'::store.user_role AND creator_tier IS NULL THEN $4
                    ELSE commission_rate
                END,
                coupon_code = COALESCE($5, coupon_code),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(role)
        .bind(CreatorTier::Rising)
        .bind(CreatorTier::Rising.commission_rate())
        .bind(coupon.map(CouponCode::as_str))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row)
    }

    /// Create an account with the `admin` role (CLI bootstrap).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_admin(
        &self,
        email: &Email,
        password_hash: &str,
        display_name: &str,
    ) -> Result<(UserId, DateTime<Utc>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (UserId, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO store.user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, created_at
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        sqlx::query("INSERT INTO store.profile (user_id, display_name, role) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(display_name)
            .bind(Role::Admin)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((id, created_at))
    }
}
