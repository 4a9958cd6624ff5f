//! Social follower verification review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use solewave_core::tier::{CreatorTier, MIN_VERIFIED_FOLLOWERS};
use solewave_core::{SocialVerificationId, VerificationStatus};

use super::audit;
use crate::db::SocialRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::SocialVerification;
use crate::state::AppState;

/// Longest review note kept.
const MAX_NOTE_LENGTH: usize = 500;

/// `GET /api/social-verifications` query.
#[derive(Deserialize)]
pub struct VerificationQuery {
    pub status: Option<VerificationStatus>,
}

/// `POST /api/social-verifications/{id}/reject` body.
#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub note: Option<String>,
}

/// `POST /api/social-verifications/{id}/approve` response.
#[derive(Serialize)]
pub struct ApproveResponse {
    pub id: SocialVerificationId,
    pub payout_tier: CreatorTier,
    /// Creator tier after the review; `None` when the user is not a creator.
    pub creator_tier: Option<CreatorTier>,
    pub bonus_credits: i64,
    pub balance: i64,
}

/// `GET /api/social-verifications?status`
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<VerificationQuery>,
) -> Result<Json<Vec<SocialVerification>>> {
    let requests = SocialRepository::new(state.pool())
        .list(query.status)
        .await?;
    Ok(Json(requests))
}

/// `POST /api/social-verifications/{id}/approve`
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<SocialVerificationId>,
) -> Result<Json<ApproveResponse>> {
    let social = SocialRepository::new(state.pool());
    let request = social
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("verification request {id}")))?;

    if request.status != VerificationStatus::Pending {
        return Err(AppError::Conflict(format!(
            "verification request is already {}",
            request.status
        )));
    }
    let payout_tier = CreatorTier::payout_tier_for_followers(request.follower_count).ok_or_else(
        || {
            AppError::Unprocessable(format!(
                "{} followers is below the {MIN_VERIFIED_FOLLOWERS} minimum",
                request.follower_count
            ))
        },
    )?;

    let approval = social.approve(id, admin.id, payout_tier).await?;

    info!(
        request_id = %id,
        user_id = %request.user_id,
        payout_tier = %payout_tier,
        bonus = approval.bonus_credits,
        "Social verification approved"
    );
    audit(
        &state,
        &admin,
        "social.approve",
        &format!("verification:{id}"),
        json!({
            "user_id": request.user_id,
            "follower_count": request.follower_count,
            "payout_tier": payout_tier,
            "bonus_credits": approval.bonus_credits,
        }),
    )
    .await;

    Ok(Json(ApproveResponse {
        id,
        payout_tier,
        creator_tier: approval.tier,
        bonus_credits: approval.bonus_credits,
        balance: approval.new_balance,
    }))
}

/// `POST /api/social-verifications/{id}/reject`
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<SocialVerificationId>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<SocialVerification>> {
    let note = body
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(MAX_NOTE_LENGTH).collect::<String>());

    let social = SocialRepository::new(state.pool());
    social.reject(id, admin.id, note.as_deref()).await?;

    audit(
        &state,
        &admin,
        "social.reject",
        &format!("verification:{id}"),
        json!({ "note": note }),
    )
    .await;

    social
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("verification request {id}")))
}
