//! Creator program views: creators, invites, social verification requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use solewave_core::tier::CreatorTier;
use solewave_core::{
    CreatorInviteId, InviteStatus, SocialPlatform, SocialVerificationId, UserId,
    VerificationStatus,
};

/// A creator with sales attributed to their coupon.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreatorSummary {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub creator_tier: Option<CreatorTier>,
    pub commission_rate: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub coupon_discount_percent: i32,
    pub credits: i64,
    pub follower_count: i64,
    pub order_count: i64,
    pub gross_sales: Decimal,
    pub commission_earned: Decimal,
    pub commission_unpaid: Decimal,
}

/// An invitation to the creator program. The token is never listed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreatorInvite {
    pub id: CreatorInviteId,
    pub email: String,
    pub tier: CreatorTier,
    pub coupon_code: String,
    pub status: InviteStatus,
    pub invited_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// A follower verification request with the requester's identity.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SocialVerification {
    pub id: SocialVerificationId,
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub platform: SocialPlatform,
    pub username: String,
    pub follower_count: i64,
    pub status: VerificationStatus,
    pub reviewed_by: Option<UserId>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Result of paying out a creator's unpaid commission as credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub orders_paid: u64,
    pub commission_total: Decimal,
    pub credits: i64,
    pub new_balance: i64,
}
