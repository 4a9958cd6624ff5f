//! Creator program types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use solewave_core::tier::CreatorTier;
use solewave_core::{
    CreatorInviteId, Email, InviteStatus, OrderId, OrderStatus, SocialPlatform,
    SocialVerificationId, UserId, VerificationStatus,
};

/// An invitation to join the creator program.
#[derive(Debug, Clone)]
pub struct CreatorInvite {
    pub id: CreatorInviteId,
    pub email: Email,
    pub tier: CreatorTier,
    pub coupon_code: String,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
}

impl CreatorInvite {
    /// Returns true if the invite can no longer be accepted because of its age.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A creator's request to have a social account's follower count verified.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SocialVerification {
    pub id: SocialVerificationId,
    pub user_id: UserId,
    pub platform: SocialPlatform,
    pub username: String,
    pub follower_count: i64,
    pub status: VerificationStatus,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Sales attributed to a creator's coupon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CreatorStats {
    pub order_count: i64,
    pub gross_sales: Decimal,
    pub commission_earned: Decimal,
    pub commission_unpaid: Decimal,
}

/// An order placed with a creator's coupon, as the creator sees it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreatorOrder {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub order_total: Decimal,
    pub commission: Decimal,
    pub commission_paid: bool,
}
