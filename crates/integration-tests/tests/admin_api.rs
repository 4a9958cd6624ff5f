//! Integration tests for the admin API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (sw-cli migrate)
//! - The admin server running (cargo run -p solewave-admin)
//! - An admin account (sw-cli admin create) whose credentials are in
//!   `SW_TEST_ADMIN_EMAIL` and `SW_TEST_ADMIN_PASSWORD`
//!
//! Run with: cargo test -p solewave-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use solewave_integration_tests::{admin_client, admin_url, session_client, unique_email};

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_protected_routes_require_session() {
    let client = session_client();
    let base = admin_url();

    for path in [
        "/api/auth/me",
        "/api/orders",
        "/api/users",
        "/api/creators",
        "/api/dashboard",
    ] {
        let resp = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_bad_credentials_are_rejected() {
    let resp = session_client()
        .post(format!("{}/api/auth/login", admin_url()))
        .json(&json!({
            "email": unique_email("nobody"),
            "password": "definitely-not-the-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Authenticated flows
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_login_me_logout() {
    let client = admin_client().await;
    let base = admin_url();

    let me: Value = client
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(me["admin"]["email"].is_string());

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(format!("{base}/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_dashboard_shape() {
    let client = admin_client().await;

    let resp = client
        .get(format!("{}/api/dashboard", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revenue_by_day"].as_array().unwrap().len(), 30);
    assert!(body["low_stock"].is_array());
    assert!(body["top_products"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_product_lifecycle() {
    let client = admin_client().await;
    let base = admin_url();
    let slug = format!("test-runner-{}", uuid::Uuid::new_v4().simple());

    let resp = client
        .post(format!("{base}/api/products"))
        .json(&json!({
            "slug": slug,
            "title": "Test Runner",
            "brand": "Solewave",
            "description": "Integration test product",
            "price": "119.00",
            "stock": 2,
            "images": [],
            "is_active": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();
    let id = product["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{base}/api/products/{id}/stock"))
        .json(&json!({ "delta": -3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(format!("{base}/api/products/{id}/stock"))
        .json(&json!({ "delta": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base}/api/products/{id}"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
#[ignore = "Requires running admin server and test admin credentials"]
async fn test_payout_without_commission_conflicts() {
    let client = admin_client().await;
    let base = admin_url();

    let creators: Value = client
        .get(format!("{base}/api/creators"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Only meaningful when some creator has nothing owed
    let idle = creators
        .as_array()
        .unwrap()
        .iter()
        .find(|c| {
            c["commission_unpaid"]
                .as_str()
                .and_then(|s| s.parse::<Decimal>().ok())
                .is_some_and(|d| d.is_zero())
        });
    if let Some(creator) = idle {
        let id = creator["user_id"].as_i64().unwrap();
        let resp = client
            .post(format!("{base}/api/creators/{id}/payout"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
