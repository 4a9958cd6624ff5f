//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                 - Liveness
//! GET  /health/ready                           - Readiness (database)
//!
//! # Catalog
//! GET  /api/products                           - Filtered, sorted, paged listing
//! GET  /api/products/{slug}                    - Product detail
//! GET  /api/brands                             - Distinct brands
//!
//! # Cart (session)
//! GET    /api/cart                             - Current cart
//! DELETE /api/cart                             - Empty the cart
//! POST   /api/cart/items                       - Add a line
//! PATCH  /api/cart/items                       - Set a line quantity (0 removes)
//! DELETE /api/cart/items                       - Remove a line
//!
//! # Checkout
//! POST /api/checkout/client-token              - Gateway client token
//! POST /api/checkout/quote                     - Price the cart
//! POST /api/checkout                           - Place and pay
//! POST /api/payments/webhook                   - Signed gateway events
//!
//! # Auth
//! POST /api/auth/register                      - Create account (rate limited)
//! POST /api/auth/login                         - Log in (rate limited)
//! POST /api/auth/logout                        - Log out
//! GET  /api/auth/session                       - Current identity
//! POST /api/auth/session/refresh               - Debounced session recovery
//!
//! # Account (requires auth)
//! GET   /api/account/profile                   - Profile
//! PATCH /api/account/profile                   - Update display name
//! POST  /api/account/avatar                    - Upload avatar (multipart)
//! GET   /api/account/orders                    - Order history
//! GET   /api/account/orders/{id}               - Order detail
//!
//! # Creator program
//! POST /api/creator/invites/{token}/accept     - Accept an invite (auth)
//! GET  /api/creator/dashboard                  - Tier, coupon and sales stats
//! GET  /api/creator/orders                     - Orders placed with the coupon
//! PUT  /api/creator/coupon                     - Change coupon code
//! GET  /api/creator/social-verifications       - Own verification requests
//! POST /api/creator/social-verifications       - Submit a request
//!
//! # Wallet (requires auth)
//! GET  /api/wallet                             - Balance and history
//! GET  /api/wallet/preview?amount=             - Credits for a top-up
//! POST /api/wallet/top-up                      - Buy credits
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod creator;
pub mod payments;
pub mod products;
pub mod wallet;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, login_rate_limiter};
use crate::state::AppState;

/// Multipart overhead allowed on top of the avatar size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Catalog routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/brands", get(products::brands))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route(
            "/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Checkout routes. Rate limited per IP.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place))
        .route("/client-token", post(checkout::client_token))
        .route("/quote", post(checkout::quote))
        .layer(api_rate_limiter())
}

/// Auth routes. Credential endpoints are rate limited per IP.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::current_session))
        .route("/session/refresh", post(auth::refresh_session))
        .merge(credentials)
}

/// Account routes.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).patch(account::update_profile),
        )
        .route(
            "/avatar",
            post(account::upload_avatar).layer(DefaultBodyLimit::max(
                account::MAX_AVATAR_BYTES + MULTIPART_OVERHEAD,
            )),
        )
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
}

/// Creator program routes.
pub fn creator_routes() -> Router<AppState> {
    Router::new()
        .route("/invites/{token}/accept", post(creator::accept_invite))
        .route("/dashboard", get(creator::dashboard))
        .route("/orders", get(creator::orders))
        .route("/coupon", put(creator::set_coupon))
        .route(
            "/social-verifications",
            get(creator::social_verifications).post(creator::submit_verification),
        )
}

/// Wallet routes.
pub fn wallet_routes() -> Router<AppState> {
    let top_up = Router::new()
        .route("/top-up", post(wallet::top_up))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(wallet::show))
        .route("/preview", get(wallet::preview))
        .merge(top_up)
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/payments/webhook", post(payments::webhook))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/creator", creator_routes())
        .nest("/wallet", wallet_routes());

    Router::new().nest("/api", api)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::{WEBHOOK_SECRET, test_config};

    fn test_state() -> AppState {
        // Lazy pool: no connection is made until a query runs
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/solewave_test")
            .unwrap();
        AppState::new(test_config(), pool).unwrap()
    }

    fn webhook_request(signature: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/payments/webhook")
            .header("content-type", "application/json")
            .header(payments::SIGNATURE_HEADER, signature)
            .body(Body::from(
                r#"{"event":"transaction.settled","reference":"1","transaction_id":"t"}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let app = routes().with_state(test_state());
        let response = app.oneshot(webhook_request("deadbeef")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_rejects_missing_signature() {
        let app = routes().with_state(test_state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/payments/webhook")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signed_garbage_is_bad_request() {
        let body = b"not json";
        let signature = crate::services::payment::sign(WEBHOOK_SECRET.as_bytes(), body);
        let request = Request::builder()
            .method("POST")
            .uri("/api/payments/webhook")
            .header(payments::SIGNATURE_HEADER, signature)
            .body(Body::from(body.to_vec()))
            .unwrap();

        let app = routes().with_state(test_state());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_account_requires_login() {
        let app = routes().with_state(test_state());
        let request = Request::builder()
            .uri("/api/account/profile")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wallet_preview() {
        let app = routes().with_state(test_state());
        let request = Request::builder()
            .uri("/api/wallet/preview?amount=100")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["credits"], 12_000);
    }
}
