//! Payment gateway webhook.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::services::CheckoutService;
use crate::services::checkout::WebhookEvent;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// `POST /api/payments/webhook`
///
/// The signature is checked over the raw bytes before the body is parsed.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !state.payments().verify_webhook(&body, signature) {
        warn!("Rejected webhook with invalid signature");
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    CheckoutService::new(state.pool(), state.payments())
        .handle_webhook(&event)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
