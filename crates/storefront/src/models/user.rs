//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use solewave_core::tier::CreatorTier;
use solewave_core::{Email, Role, UserId};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// A user's profile: display data, role, creator program state and wallet balance.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_creator: bool,
    pub creator_tier: Option<CreatorTier>,
    pub commission_rate: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub coupon_discount_percent: i32,
    pub credits: i64,
    pub follower_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
