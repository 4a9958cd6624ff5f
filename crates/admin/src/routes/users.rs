//! User administration route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use solewave_core::coupon::CouponCode;
use solewave_core::{Role, UserId};

use super::audit;
use crate::db::{UserRepository, wallet};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Page, Profile, UserFilter, UserSummary};
use crate::state::AppState;

/// Longest grant note kept.
const MAX_NOTE_LENGTH: usize = 200;

/// `PATCH /api/users/{id}/role` body.
#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: Role,
    /// Required when promoting to creator without an existing code.
    pub coupon_code: Option<String>,
}

/// `POST /api/users/{id}/credits` body.
#[derive(Deserialize)]
pub struct GrantRequest {
    /// Signed: negative withdraws.
    pub credits: i64,
    pub note: Option<String>,
}

/// `POST /api/users/{id}/credits` response.
#[derive(Serialize)]
pub struct GrantResponse {
    pub user_id: UserId,
    pub credits: i64,
    pub balance: i64,
}

/// `GET /api/users?role&q&page&per_page`
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Page<UserSummary>>> {
    let page = UserRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page))
}

/// `GET /api/users/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<Profile>> {
    UserRepository::new(state.pool())
        .get_profile(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// `PATCH /api/users/{id}/role`
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<Profile>> {
    if id == admin.id {
        return Err(AppError::Forbidden(
            "admins cannot change their own role".to_string(),
        ));
    }

    let coupon = body
        .coupon_code
        .as_deref()
        .map(CouponCode::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let users = UserRepository::new(state.pool());
    let current = users
        .get_profile(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    if body.role == Role::Creator && coupon.is_none() && current.coupon_code.is_none() {
        return Err(AppError::BadRequest(
            "a coupon code is required to make this user a creator".to_string(),
        ));
    }

    let profile = users.set_role(id, body.role, coupon.as_ref()).await?;

    info!(user_id = %id, from = %current.role, to = %profile.role, "User role changed");
    audit(
        &state,
        &admin,
        "user.role",
        &format!("user:{id}"),
        json!({ "from": current.role, "to": profile.role, "coupon_code": profile.coupon_code }),
    )
    .await;

    Ok(Json(profile))
}

/// `POST /api/users/{id}/credits`
pub async fn grant_credits(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<GrantRequest>,
) -> Result<Json<GrantResponse>> {
    if body.credits == 0 {
        return Err(AppError::BadRequest("credits must not be zero".to_string()));
    }
    let note = body
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(MAX_NOTE_LENGTH).collect::<String>());

    let balance = wallet::grant(state.pool(), id, body.credits, note.as_deref()).await?;

    info!(user_id = %id, credits = body.credits, balance, "Credits granted");
    audit(
        &state,
        &admin,
        "user.credits",
        &format!("user:{id}"),
        json!({ "credits": body.credits, "note": note, "balance": balance }),
    )
    .await;

    Ok(Json(GrantResponse {
        user_id: id,
        credits: body.credits,
        balance,
    }))
}
