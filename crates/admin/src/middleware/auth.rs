//! Admin authentication extractor.
//!
//! The session only says who logged in. Every request re-reads the role so a
//! demoted admin loses access immediately.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use solewave_core::Role;

use crate::db::UserRepository;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in admin whose role is still `admin`.
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when a request lacks an admin identity.
#[derive(Debug)]
pub enum AdminRejection {
    /// Not logged in.
    Unauthorized,
    /// Logged in, but no longer an admin.
    Forbidden,
    /// The role could not be checked.
    Internal,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminRejection::Unauthorized)?;
        let admin = session
            .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminRejection::Unauthorized)?;

        let role = UserRepository::new(state.pool())
            .role(admin.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, admin_id = %admin.id, "Failed to check admin role");
                AdminRejection::Internal
            })?;

        match role {
            Some(Role::Admin) => Ok(Self(admin)),
            Some(_) => Err(AdminRejection::Forbidden),
            None => Err(AdminRejection::Unauthorized),
        }
    }
}

/// Store the logged-in admin, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the admin session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AdminRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
