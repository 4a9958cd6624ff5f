//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use solewave_core::checkout::CheckoutQuote;

use super::cart::{load_cart, save_cart};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::CheckoutService;
use crate::services::checkout::{PlaceOrder, PlacedOrder};
use crate::state::AppState;

/// `POST /api/checkout/quote` body.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub credits_to_redeem: i64,
}

/// `POST /api/checkout/client-token` response.
#[derive(Debug, Serialize)]
pub struct ClientToken {
    pub client_token: String,
}

/// `POST /api/checkout/client-token`
pub async fn client_token(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<ClientToken>> {
    let client_token = state.payments().client_token().await?;
    Ok(Json(ClientToken { client_token }))
}

/// `POST /api/checkout/quote`
#[instrument(skip(state, session, body), fields(user_id = %user.id))]
pub async fn quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<CheckoutQuote>> {
    let cart = load_cart(&session).await?;
    let quote = CheckoutService::new(state.pool(), state.payments())
        .quote(
            user.id,
            &cart,
            body.coupon_code.as_deref(),
            body.credits_to_redeem,
        )
        .await?;
    Ok(Json(quote))
}

/// `POST /api/checkout`
///
/// Clears the cart once the order is paid. A failed payment answers 402 and
/// leaves the cart intact so the client can retry with a new nonce.
#[instrument(skip(state, session, body), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let mut cart = load_cart(&session).await?;
    let placed = CheckoutService::new(state.pool(), state.payments())
        .place_order(user.id, &cart, &body)
        .await?;

    cart.clear();
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_id", placed.order_id.to_string())],
    );
    Ok((StatusCode::CREATED, Json(placed)))
}

