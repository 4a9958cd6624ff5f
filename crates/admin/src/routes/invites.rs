//! Creator invitation route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::json;

use solewave_core::tier::CreatorTier;
use solewave_core::{CreatorInviteId, InviteStatus};

use super::audit;
use crate::db::InviteRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::CreatorInvite;
use crate::services::{InviteCreated, InviteService};
use crate::state::AppState;

/// `POST /api/invites` body.
#[derive(Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    #[serde(default)]
    pub tier: CreatorTier,
    /// Suggested from the email when absent.
    pub coupon_code: Option<String>,
}

/// `GET /api/invites` query.
#[derive(Deserialize)]
pub struct InviteQuery {
    pub status: Option<InviteStatus>,
}

/// `POST /api/invites`
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteCreated>)> {
    let created = InviteService::new(state.pool(), state.email(), state.config())
        .create(admin.id, &body.email, body.tier, body.coupon_code.as_deref())
        .await?;

    audit(
        &state,
        &admin,
        "invite.create",
        &format!("invite:{}", created.invite.id),
        json!({
            "email": created.invite.email,
            "tier": created.invite.tier,
            "coupon_code": created.invite.coupon_code,
            "email_sent": created.email_sent,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/invites?status`
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<InviteQuery>,
) -> Result<Json<Vec<CreatorInvite>>> {
    let invites = InviteRepository::new(state.pool())
        .list(query.status)
        .await?;
    Ok(Json(invites))
}

/// `POST /api/invites/{id}/revoke`
pub async fn revoke(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CreatorInviteId>,
) -> Result<Json<CreatorInvite>> {
    let invite = InviteRepository::new(state.pool()).revoke(id).await?;

    audit(
        &state,
        &admin,
        "invite.revoke",
        &format!("invite:{id}"),
        json!({ "email": invite.email }),
    )
    .await;

    Ok(Json(invite))
}
