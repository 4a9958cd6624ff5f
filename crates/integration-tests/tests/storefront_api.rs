//! Integration tests for the storefront API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (sw-cli migrate)
//! - The storefront server running (cargo run -p solewave-storefront)
//! - At least one active product (sw-cli seed products -f catalog.yaml)
//!
//! Run with: cargo test -p solewave-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use solewave_integration_tests::{session_client, storefront_url, unique_email};

const PASSWORD: &str = "correct-horse-battery";

async fn first_product_id(client: &reqwest::Client) -> i64 {
    let listing: Value = client
        .get(format!("{}/api/products?per_page=1", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    listing["items"][0]["id"]
        .as_i64()
        .expect("at least one seeded product")
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = session_client();
    let base = storefront_url();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get(format!("{base}/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Catalog and cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_listing_is_paged() {
    let client = session_client();
    let base = storefront_url();

    let resp = client
        .get(format!("{base}/api/products?per_page=2&page=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 2);
    assert!(body["items"].as_array().unwrap().len() <= 2);
    assert!(body["total"].as_i64().unwrap() >= 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server with seeded products"]
async fn test_anonymous_cart_round_trip() {
    let client = session_client();
    let base = storefront_url();

    let product_id = first_product_id(&client).await;

    let resp = client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = client
        .get(format!("{base}/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 1);

    let resp = client.delete(format!("{base}/api/cart")).send().await.unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
#[ignore = "Requires running storefront server with seeded products"]
async fn test_zero_quantity_is_rejected() {
    let client = session_client();
    let base = storefront_url();
    let product_id = first_product_id(&client).await;

    let resp = client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product_id, "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Auth and session
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_logout_flow() {
    let client = session_client();
    let base = storefront_url();
    let email = unique_email("shopper");

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "display_name": "Test Shopper",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["role"], "customer");
    assert_eq!(body["profile"]["credits"], 0);

    let session: Value = client
        .get(format!("{base}/api/auth/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["user"]["email"], email.as_str());

    let resp = client
        .post(format!("{base}/api/auth/session/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base}/api/wallet"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let wallet: Value = client
        .get(format!("{base}/api/wallet"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(wallet["credits"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_registration_conflicts() {
    let client = session_client();
    let base = storefront_url();
    let email = unique_email("dupe");
    let body = json!({
        "email": email,
        "password": PASSWORD,
        "display_name": "Dupe",
    });

    let first = client
        .post(format!("{base}/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = session_client()
        .post(format!("{base}/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_creator_routes_require_creator() {
    let client = session_client();
    let base = storefront_url();

    let resp = client
        .get(format!("{base}/api/creator/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({
            "email": unique_email("notcreator"),
            "password": PASSWORD,
            "display_name": "Not A Creator",
        }))
        .send()
        .await
        .unwrap();

    let resp = client
        .get(format!("{base}/api/creator/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_wallet_preview_applies_bonus() {
    let client = session_client();
    let base = storefront_url();

    client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({
            "email": unique_email("wallet"),
            "password": PASSWORD,
            "display_name": "Wallet Tester",
        }))
        .send()
        .await
        .unwrap();

    let preview: Value = client
        .get(format!("{base}/api/wallet/preview?amount=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["credits"], 12_000);
}
