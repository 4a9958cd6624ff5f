//! Creator program route handlers.
//!
//! Everything except invite acceptance requires an active creator (or admin).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use solewave_core::coupon::CouponCode;
use solewave_core::tier::CreatorTier;
use solewave_core::{InviteStatus, SocialPlatform};

use crate::db::{CreatorRepository, SocialRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireCreator, set_current_user};
use crate::models::{CreatorOrder, CreatorStats, CurrentUser, Profile, SocialVerification};
use crate::state::AppState;

/// Longest social handle accepted.
const MAX_USERNAME_LENGTH: usize = 100;

/// `GET /api/creator/dashboard` response.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub tier: Option<CreatorTier>,
    pub commission_rate: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub coupon_discount_percent: i32,
    pub credits: i64,
    pub follower_count: i64,
    pub stats: CreatorStats,
}

/// `PUT /api/creator/coupon` body.
#[derive(Debug, Deserialize)]
pub struct SetCoupon {
    pub code: String,
}

/// `PUT /api/creator/coupon` response.
#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub coupon_code: String,
}

/// `POST /api/creator/social-verifications` body.
#[derive(Debug, Deserialize)]
pub struct SubmitVerification {
    pub platform: SocialPlatform,
    pub username: String,
    pub follower_count: i64,
}

impl SubmitVerification {
    /// Trimmed handle without a leading `@`, and a non-negative count.
    fn validate(&self) -> Result<String> {
        let username = self.username.trim().trim_start_matches('@').trim();
        if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Username must be 1 to {MAX_USERNAME_LENGTH} characters"
            )));
        }
        if self.follower_count < 0 {
            return Err(AppError::BadRequest(
                "Follower count cannot be negative".to_string(),
            ));
        }
        Ok(username.to_string())
    }
}

/// `POST /api/creator/invites/{token}/accept`
///
/// The invite must be pending, unexpired and addressed to the caller's email.
#[instrument(skip(state, session, token), fields(user_id = %user.id))]
pub async fn accept_invite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(token): Path<String>,
) -> Result<Json<Profile>> {
    let creators = CreatorRepository::new(state.pool());
    let invite = creators
        .get_invite_by_token(&token)
        .await?
        .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

    if invite.status != InviteStatus::Pending {
        return Err(AppError::Conflict(format!("Invite is {}", invite.status)));
    }
    if invite.is_expired() {
        return Err(AppError::Conflict("Invite has expired".to_string()));
    }
    if invite.email != user.email {
        return Err(AppError::Forbidden(
            "This invite was sent to a different email address".to_string(),
        ));
    }

    creators.accept_invite(&invite, user.id).await?;
    info!(invite_id = %invite.id, tier = %invite.tier, "Creator invite accepted");

    let users = UserRepository::new(state.pool());
    let (account, profile) = match (
        users.get_by_id(user.id).await?,
        users.get_profile(user.id).await?,
    ) {
        (Some(account), Some(profile)) => (account, profile),
        _ => return Err(AppError::NotFound("Profile not found".to_string())),
    };
    set_current_user(&session, &CurrentUser::from_parts(&account, &profile)).await?;

    Ok(Json(profile))
}

/// `GET /api/creator/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    creator: RequireCreator,
) -> Result<Json<Dashboard>> {
    let stats = CreatorRepository::new(state.pool())
        .stats(creator.user.id)
        .await?;
    let profile = creator.profile;

    Ok(Json(Dashboard {
        tier: profile.creator_tier,
        commission_rate: profile.commission_rate,
        coupon_code: profile.coupon_code,
        coupon_discount_percent: profile.coupon_discount_percent,
        credits: profile.credits,
        follower_count: profile.follower_count,
        stats,
    }))
}

/// `GET /api/creator/orders`
pub async fn orders(
    State(state): State<AppState>,
    creator: RequireCreator,
) -> Result<Json<Vec<CreatorOrder>>> {
    let orders = CreatorRepository::new(state.pool())
        .orders(creator.user.id)
        .await?;
    Ok(Json(orders))
}

/// `PUT /api/creator/coupon`
#[instrument(skip(state, creator), fields(user_id = %creator.user.id))]
pub async fn set_coupon(
    State(state): State<AppState>,
    creator: RequireCreator,
    Json(body): Json<SetCoupon>,
) -> Result<Json<CouponResponse>> {
    let code = CouponCode::parse(&body.code).map_err(|e| AppError::BadRequest(e.to_string()))?;
    CreatorRepository::new(state.pool())
        .set_coupon_code(creator.user.id, &code)
        .await?;
    Ok(Json(CouponResponse {
        coupon_code: code.as_str().to_string(),
    }))
}

/// `GET /api/creator/social-verifications`
pub async fn social_verifications(
    State(state): State<AppState>,
    creator: RequireCreator,
) -> Result<Json<Vec<SocialVerification>>> {
    let requests = SocialRepository::new(state.pool())
        .list_for_user(creator.user.id)
        .await?;
    Ok(Json(requests))
}

/// `POST /api/creator/social-verifications`
#[instrument(skip(state, creator, body), fields(user_id = %creator.user.id))]
pub async fn submit_verification(
    State(state): State<AppState>,
    creator: RequireCreator,
    Json(body): Json<SubmitVerification>,
) -> Result<(StatusCode, Json<SocialVerification>)> {
    let username = body.validate()?;
    let request = SocialRepository::new(state.pool())
        .create(creator.user.id, body.platform, &username, body.follower_count)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(username: &str, follower_count: i64) -> SubmitVerification {
        SubmitVerification {
            platform: SocialPlatform::Instagram,
            username: username.to_string(),
            follower_count,
        }
    }

    #[test]
    fn test_username_normalized() {
        let name = submission("  @kicks.daily ", 12_000).validate();
        assert!(matches!(name.as_deref(), Ok("kicks.daily")));
    }

    #[test]
    fn test_rejects_blank_username_and_negative_count() {
        assert!(submission(" @ ", 10).validate().is_err());
        assert!(submission("kicks", -1).validate().is_err());
        assert!(submission(&"a".repeat(MAX_USERNAME_LENGTH + 1), 0).validate().is_err());
    }
}
