//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user (or a creator) in route
//! handlers. Rejections are JSON bodies matching `AppError`.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::models::{CurrentUser, Profile, session_keys};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a request lacks the required identity.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in.
    Unauthorized,
    /// Logged in, but not allowed.
    Forbidden,
    /// The profile could not be loaded.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Creator access required"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Extractor that requires an active creator (or an admin).
///
/// The session identity is only a snapshot, so the profile is re-read from the
/// database and the creator flag checked there.
pub struct RequireCreator {
    /// Session identity.
    pub user: CurrentUser,
    /// Fresh profile row.
    pub profile: Profile,
}

impl FromRequestParts<AppState> for RequireCreator {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;

        let profile = UserRepository::new(state.pool())
            .get_profile(user.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user.id, "Failed to load profile");
                AuthRejection::Internal
            })?
            .ok_or(AuthRejection::Unauthorized)?;

        if !profile.is_creator && profile.role != solewave_core::Role::Admin {
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self { user, profile })
    }
}

/// Helper to set the current user in the session.
///
/// The session id is rotated first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    session
        .insert(session_keys::LAST_REFRESH, chrono::Utc::now().timestamp())
        .await
}

/// Helper to clear the current user from the session (logout).
///
/// The cart survives logout.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove::<i64>(session_keys::LAST_REFRESH).await?;
    session.cycle_id().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_require_auth_without_session_is_unauthorized() {
        let (mut parts, ()) = Request::builder()
            .uri("/api/account/profile")
            .body(())
            .unwrap()
            .into_parts();
        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthorized)));
    }

    #[tokio::test]
    async fn test_optional_auth_without_session_is_none() {
        let (mut parts, ()) = Request::builder()
            .uri("/api/products")
            .body(())
            .unwrap()
            .into_parts();
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap_or_else(|never| match never {});
        assert!(user.is_none());
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
