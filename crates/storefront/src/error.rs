//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Error bodies are JSON: `{ "error": "message" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use solewave_core::cart::CartError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutFailure;
use crate::services::payment::PaymentError;
use crate::services::session_refresh::RefreshError;
use crate::services::wallet::TopUpError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout could not be completed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutFailure),

    /// Credit purchase failed.
    #[error("Top-up error: {0}")]
    TopUp(#[from] TopUpError),

    /// Payment gateway call failed outside checkout.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Session refresh failed.
    #[error("Session error: {0}")]
    Refresh(#[from] RefreshError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";
const PAYMENT_FAILED_MESSAGE: &str = "Payment could not be processed";

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidDisplayName(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(err) => repository_status(err),
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutFailure::Pricing(_)
                | CheckoutFailure::InvalidCoupon(_)
                | CheckoutFailure::UnknownCoupon
                | CheckoutFailure::OwnCoupon
                | CheckoutFailure::InvalidShipping(_) => StatusCode::BAD_REQUEST,
                CheckoutFailure::Unavailable { .. } | CheckoutFailure::OutOfStock { .. } => {
                    StatusCode::CONFLICT
                }
                CheckoutFailure::Declined { .. } | CheckoutFailure::Payment(_) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                CheckoutFailure::Repository(err) => repository_status(err),
            },
            Self::TopUp(err) => match err {
                TopUpError::InvalidAmount => StatusCode::BAD_REQUEST,
                TopUpError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
                TopUpError::Repository(err) => repository_status(err),
            },
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Cart(CartError::LineNotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Refresh(err) => match err {
                RefreshError::AccountGone => StatusCode::UNAUTHORIZED,
                RefreshError::Repository(err) => repository_status(err),
                RefreshError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message shown to the client.
    ///
    /// Server-side failures never leak their details.
    #[must_use]
    pub fn client_message(&self) -> String {
        let status = self.status();
        if status.is_server_error() {
            return match self {
                Self::Payment(_) => "Payment service error".to_string(),
                _ => INTERNAL_MESSAGE.to_string(),
            };
        }

        match self {
            Self::Database(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) | AuthError::InvalidDisplayName(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Checkout(CheckoutFailure::Payment(_)) | Self::TopUp(TopUpError::Payment(_)) => {
                PAYMENT_FAILED_MESSAGE.to_string()
            }
            Self::Checkout(err) => err.to_string(),
            Self::TopUp(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Refresh(RefreshError::AccountGone) => "Session expired".to_string(),
            Self::Refresh(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors and failed payments to Sentry
        if status.is_server_error()
            || matches!(
                self,
                Self::Checkout(CheckoutFailure::Payment(_)) | Self::TopUp(TopUpError::Payment(_))
            )
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "error": self.client_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use solewave_core::OrderId;
    use solewave_core::checkout::CheckoutError;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_by_kind() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("coupon code already exists".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::Database(sqlx::Error::PoolTimedOut).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_failures() {
        assert_eq!(
            get_status(CheckoutFailure::Pricing(CheckoutError::EmptyCart).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CheckoutFailure::OutOfStock {
                    title: "Runner".into(),
                    available: 1
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CheckoutFailure::Declined {
                    order_id: OrderId::new(7)
                }
                .into()
            ),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(TopUpError::InvalidAmount.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_cart_errors() {
        assert_eq!(
            get_status(CartError::LineNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::LineQuantityExceeded.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad email row 9".into()));
        assert_eq!(err.client_message(), "Internal server error");

        let err = AppError::Auth(AuthError::UserNotFound);
        assert_eq!(err.client_message(), "Invalid credentials");
    }

    #[test]
    fn test_gateway_failures_are_generic() {
        let gateway = || PaymentError::Gateway {
            status: 503,
            body: "upstream https://gateway.internal/v1/transactions timed out".into(),
        };

        let err = AppError::Checkout(CheckoutFailure::Payment(gateway()));
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.client_message(), "Payment could not be processed");

        let err = AppError::TopUp(TopUpError::Payment(gateway()));
        assert_eq!(err.client_message(), "Payment could not be processed");
    }

    #[tokio::test]
    async fn test_body_is_json() {
        let response = AppError::Conflict("coupon code already exists".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "coupon code already exists");
    }
}
