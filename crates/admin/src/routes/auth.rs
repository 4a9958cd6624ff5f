//! Admin authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Logged-in admin identity.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub admin: CurrentAdmin,
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<MeResponse>> {
    let admin = AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(MeResponse { admin }))
}

/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(RequireAdmin(admin): RequireAdmin) -> Json<MeResponse> {
    Json(MeResponse { admin })
}
