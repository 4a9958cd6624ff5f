//! Integration tests for Solewave.
//!
//! # Running Tests
//!
//! ```bash
//! # Cross-crate rules, no services needed
//! cargo test -p solewave-integration-tests
//!
//! # Against running servers (storefront on 3000, admin on 3001)
//! cargo test -p solewave-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `creator_economics` - Pricing, commission, payouts and bonuses end to end
//! - `storefront_api` - Storefront HTTP API (ignored by default)
//! - `admin_api` - Admin HTTP API (ignored by default)
//! - `money_flows` - Checkout, cancellation, verification and payout across
//!   both servers (ignored by default)
//!
//! The admin and money flow tests log in with `SW_TEST_ADMIN_EMAIL` / `SW_TEST_ADMIN_PASSWORD`,
//! an account created with `sw-cli admin create`.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::json;

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client that keeps session cookies between requests.
///
/// Each client presents its own `x-real-ip`, so the servers' per-IP rate
/// limits treat every test client as a separate visitor.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
pub fn session_client() -> Client {
    let [a, b, c, ..] = uuid::Uuid::new_v4().into_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-real-ip",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique throwaway email for one test run.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}+{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Log in as the test admin and return a client carrying the session cookie.
///
/// # Panics
///
/// Panics if `SW_TEST_ADMIN_EMAIL` / `SW_TEST_ADMIN_PASSWORD` are unset or the
/// login fails.
pub async fn admin_client() -> Client {
    let email = std::env::var("SW_TEST_ADMIN_EMAIL").expect("SW_TEST_ADMIN_EMAIL not set");
    let password =
        std::env::var("SW_TEST_ADMIN_PASSWORD").expect("SW_TEST_ADMIN_PASSWORD not set");

    let client = session_client();
    let resp = client
        .post(format!("{}/api/auth/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK, "admin login failed");
    client
}
