//! Authentication route handlers.
//!
//! Email/password registration and login, logout, the current session and
//! session recovery.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile};
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Login body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Identity plus profile, returned after login and registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: CurrentUser,
    pub profile: Profile,
}

/// `GET /api/auth/session` response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<CurrentUser>,
}

/// `POST /api/auth/session/refresh` response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub user: CurrentUser,
    pub refreshed: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/auth/register`
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (user, profile) = AuthService::new(state.pool())
        .register(
            &body.email,
            &body.password,
            &body.display_name,
        )
        .await?;

    let current = CurrentUser::from_parts(&user, &profile);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    info!(user_id = %current.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: current,
            profile,
        }),
    ))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (user, profile) = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let current = CurrentUser::from_parts(&user, &profile);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    info!(user_id = %current.id, "User logged in");

    Ok(Json(AuthResponse {
        user: current,
        profile,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/session`
pub async fn current_session(OptionalAuth(user): OptionalAuth) -> Json<SessionResponse> {
    Json(SessionResponse { user })
}

/// `POST /api/auth/session/refresh`
///
/// Called by the client on focus and after network errors.
#[instrument(skip_all)]
pub async fn refresh_session(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<RefreshResponse>> {
    let outcome = state.refresher().refresh(state.pool(), &session).await?;
    let user = outcome
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;
    Ok(Json(RefreshResponse {
        user,
        refreshed: outcome.refreshed,
    }))
}
