//! HTTP route handlers for admin.
//!
//! Every route except login and logout requires an admin session.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness
//! GET  /health/ready                            - Readiness (database)
//!
//! # Auth
//! POST /api/auth/login                          - Log in (rate limited)
//! POST /api/auth/logout                         - Log out
//! GET  /api/auth/me                             - Current admin
//!
//! # Orders
//! GET   /api/orders                             - Paged listing, status filter
//! GET   /api/orders/{id}                        - Detail with items
//! PATCH /api/orders/{id}/status                 - Guarded transition
//!
//! # Catalog
//! GET    /api/products                          - All products, paged
//! POST   /api/products                          - Create
//! PUT    /api/products/{id}                     - Replace
//! DELETE /api/products/{id}                     - Deactivate
//! POST   /api/products/{id}/stock               - Adjust stock
//! POST   /api/products/sync                     - Upsert by slug
//!
//! # Users
//! GET   /api/users                              - Paged listing with emails
//! GET   /api/users/{id}                         - Profile
//! PATCH /api/users/{id}/role                    - Change role
//! POST  /api/users/{id}/credits                 - Grant or withdraw credits
//!
//! # Creator program
//! GET   /api/creators                           - Creators with sales stats
//! PATCH /api/creators/{id}/tier                 - Change tier
//! PATCH /api/creators/{id}/coupon               - Change or remove coupon
//! POST  /api/creators/{id}/payout               - Pay commission as credits
//! GET   /api/invites                            - Invitations
//! POST  /api/invites                            - Invite and email
//! POST  /api/invites/{id}/revoke                - Revoke a pending invite
//! GET   /api/social-verifications               - Verification requests
//! POST  /api/social-verifications/{id}/approve  - Approve and grant bonus
//! POST  /api/social-verifications/{id}/reject   - Reject
//!
//! # Analytics
//! GET  /api/dashboard                           - Dashboard figures
//! ```

pub mod auth;
pub mod creators;
pub mod dashboard;
pub mod invites;
pub mod orders;
pub mod products;
pub mod social;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::db::AuditRepository;
use crate::middleware::login_rate_limiter;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Record an admin mutation. A failed write is logged, never surfaced: the
/// mutation itself has already committed.
pub(crate) async fn audit(
    state: &AppState,
    admin: &CurrentAdmin,
    action: &str,
    target: &str,
    details: serde_json::Value,
) {
    if let Err(e) = AuditRepository::new(state.pool())
        .record(admin.id, action, target, &details)
        .await
    {
        tracing::warn!(error = %e, action, target, "Failed to write audit log");
    }
}

/// Auth routes. Login is rate limited per IP.
pub fn auth_routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(login)
}

/// Order routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
}

/// Catalog routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/sync", post(products::sync))
        .route(
            "/{id}",
            put(products::update).delete(products::deactivate),
        )
        .route("/{id}/stock", post(products::adjust_stock))
}

/// User routes.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", get(users::show))
        .route("/{id}/role", patch(users::set_role))
        .route("/{id}/credits", post(users::grant_credits))
}

/// Creator program routes.
pub fn creator_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(creators::index))
        .route("/{id}/tier", patch(creators::set_tier))
        .route("/{id}/coupon", patch(creators::set_coupon))
        .route("/{id}/payout", post(creators::payout))
}

/// Invitation routes.
pub fn invite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(invites::index).post(invites::create))
        .route("/{id}/revoke", post(invites::revoke))
}

/// Social verification review routes.
pub fn social_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(social::index))
        .route("/{id}/approve", post(social::approve))
        .route("/{id}/reject", post(social::reject))
}

/// Create all API routes for the admin.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/orders", order_routes())
        .nest("/products", product_routes())
        .nest("/users", user_routes())
        .nest("/creators", creator_routes())
        .nest("/invites", invite_routes())
        .nest("/social-verifications", social_routes())
        .route("/dashboard", get(dashboard::show));

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
    use crate::config::tests::test_config;

    fn test_state() -> AppState {
        // Lazy pool: no connection is made until a query runs
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/solewave_test")
            .unwrap();
        AppState::new(test_config(), pool).unwrap()
    }

    async fn status_of(method: &str, uri: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        routes()
            .with_state(test_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_protected_routes_require_admin_session() {
        for (method, uri, body) in [
            ("GET", "/api/auth/me", ""),
            ("GET", "/api/dashboard", ""),
            ("GET", "/api/orders?status=paid", ""),
            ("PATCH", "/api/orders/1/status", r#"{"status":"shipped"}"#),
            ("POST", "/api/products/3/stock", r#"{"delta":2}"#),
            ("PATCH", "/api/users/4/role", r#"{"role":"creator"}"#),
            ("POST", "/api/creators/5/payout", ""),
            ("POST", "/api/invites", r#"{"email":"jay@example.com"}"#),
            ("POST", "/api/social-verifications/6/approve", ""),
        ] {
            assert_eq!(
                status_of(method, uri, body).await,
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        assert_eq!(
            status_of("GET", "/api/shipments", "").await,
            StatusCode::NOT_FOUND
        );
    }
}
