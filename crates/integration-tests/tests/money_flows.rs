//! Flows that move stock, credits and commission across both servers.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (sw-cli migrate)
//! - The storefront server (cargo run -p solewave-storefront) pointed at a
//!   sandbox payment gateway
//! - The admin server (cargo run -p solewave-admin)
//! - Test admin credentials in `SW_TEST_ADMIN_EMAIL` / `SW_TEST_ADMIN_PASSWORD`
//!
//! Optional:
//! - `SW_TEST_DECLINED_NONCE` - a sandbox nonce the gateway declines
//!   (default: `fake-processor-declined-visa-nonce`)
//! - `SW_TEST_WEBHOOK_SECRET` - the storefront's `PAYMENT_WEBHOOK_SECRET`,
//!   needed by the webhook tests
//!
//! Each test creates its own product and accounts, so they can run in any
//! order against a shared database.
//!
//! Run with: cargo test -p solewave-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use solewave_integration_tests::{
    admin_client, admin_url, session_client, storefront_url, unique_email,
};
use solewave_storefront::routes::payments::SIGNATURE_HEADER;
use solewave_storefront::services::payment::sign;

const PASSWORD: &str = "correct-horse-battery";

fn declined_nonce() -> String {
    std::env::var("SW_TEST_DECLINED_NONCE")
        .unwrap_or_else(|_| "fake-processor-declined-visa-nonce".to_string())
}

fn shipping() -> Value {
    json!({
        "name": "Test Buyer",
        "address1": "1 Test Street",
        "city": "Portland",
        "region": "OR",
        "postal_code": "97201",
        "country": "US",
    })
}

fn dec(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("not a decimal: {value}"))
}

/// Register a storefront account. Returns its cookie client and user id.
async fn register(prefix: &str) -> (Client, i64) {
    let client = session_client();
    let resp = client
        .post(format!("{}/api/auth/register", storefront_url()))
        .json(&json!({
            "email": unique_email(prefix),
            "password": PASSWORD,
            "display_name": format!("Test {prefix}"),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let id = body["user"]["id"].as_i64().unwrap();
    (client, id)
}

async fn create_product(admin: &Client, price: &str, stock: i32) -> i64 {
    let resp = admin
        .post(format!("{}/api/products", admin_url()))
        .json(&json!({
            "slug": format!("flow-test-{}", uuid::Uuid::new_v4().simple()),
            "title": "Flow Test Runner",
            "brand": "Solewave",
            "price": price,
            "stock": stock,
            "is_active": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();
    product["id"].as_i64().unwrap()
}

/// Current stock, read through a net-zero adjustment so the storefront's
/// catalog cache is bypassed.
async fn stock_of(admin: &Client, product_id: i64) -> i64 {
    let url = format!("{}/api/products/{product_id}/stock", admin_url());
    let resp = admin.post(&url).json(&json!({ "delta": 1 })).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = admin
        .post(&url)
        .json(&json!({ "delta": -1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["stock"].as_i64().unwrap()
}

async fn credits_of(admin: &Client, user_id: i64) -> i64 {
    let profile: Value = admin
        .get(format!("{}/api/users/{user_id}", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    profile["credits"].as_i64().unwrap()
}

async fn grant(admin: &Client, user_id: i64, credits: i64) {
    let resp = admin
        .post(format!("{}/api/users/{user_id}/credits", admin_url()))
        .json(&json!({ "credits": credits, "note": "integration test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

/// Promote a user to creator with a fresh coupon code (Rising tier, 10 % off).
async fn make_creator(admin: &Client, user_id: i64) -> String {
    let code = format!("T{}", &uuid::Uuid::new_v4().simple().to_string()[..10]).to_uppercase();
    let resp = admin
        .patch(format!("{}/api/users/{user_id}/role", admin_url()))
        .json(&json!({ "role": "creator", "coupon_code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    code
}

async fn add_to_cart(client: &Client, product_id: i64, quantity: u32) {
    let resp = client
        .post(format!("{}/api/cart/items", storefront_url()))
        .json(&json!({ "product_id": product_id, "quantity": quantity }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

/// Buy one unit of `product_id` paid entirely with credits (no gateway call).
async fn credit_only_order(admin: &Client, product_id: i64, credits: i64) -> (Client, i64, i64) {
    let (buyer, buyer_id) = register("buyer").await;
    grant(admin, buyer_id, credits).await;
    add_to_cart(&buyer, product_id, 1).await;

    let resp = buyer
        .post(format!("{}/api/checkout", storefront_url()))
        .json(&json!({
            "shipping": shipping(),
            "payment_nonce": "unused",
            "credits_to_redeem": credits,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.unwrap();
    assert_eq!(placed["status"], "paid");
    assert_eq!(dec(&placed["quote"]["total"]), Decimal::ZERO);

    let order_id = placed["order_id"].as_i64().unwrap();
    (buyer, buyer_id, order_id)
}

async fn order_status(buyer: &Client, order_id: i64) -> String {
    let order: Value = buyer
        .get(format!("{}/api/account/orders/{order_id}", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    order["status"].as_str().unwrap().to_string()
}

async fn send_webhook(event: &str, order_id: i64) -> StatusCode {
    let secret = std::env::var("SW_TEST_WEBHOOK_SECRET").expect("SW_TEST_WEBHOOK_SECRET not set");
    let body = json!({
        "event": event,
        "reference": order_id.to_string(),
        "transaction_id": format!("test-{order_id}"),
    })
    .to_string();

    session_client()
        .post(format!("{}/api/payments/webhook", storefront_url()))
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign(secret.as_bytes(), body.as_bytes()))
        .body(body)
        .send()
        .await
        .unwrap()
        .status()
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and admin servers with a sandbox gateway"]
async fn test_declined_payment_restores_stock_and_credits() {
    let admin = admin_client().await;
    let product_id = create_product(&admin, "100.00", 5).await;

    let (_creator, creator_id) = register("creator").await;
    let coupon = make_creator(&admin, creator_id).await;

    let (buyer, buyer_id) = register("buyer").await;
    grant(&admin, buyer_id, 2_000).await;
    add_to_cart(&buyer, product_id, 2).await;

    let quote: Value = buyer
        .post(format!("{}/api/checkout/quote", storefront_url()))
        .json(&json!({ "coupon_code": coupon, "credits_to_redeem": 1_000 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&quote["subtotal"]), Decimal::from(200));
    assert_eq!(dec(&quote["discount_amount"]), Decimal::from(20));
    assert_eq!(dec(&quote["credit_discount"]), Decimal::from(10));
    assert_eq!(dec(&quote["total"]), Decimal::from(170));

    let resp = buyer
        .post(format!("{}/api/checkout", storefront_url()))
        .json(&json!({
            "shipping": shipping(),
            "payment_nonce": declined_nonce(),
            "coupon_code": coupon,
            "credits_to_redeem": 1_000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

    // The reservation was rolled back by the compensating transaction
    assert_eq!(stock_of(&admin, product_id).await, 5);
    assert_eq!(credits_of(&admin, buyer_id).await, 2_000);

    let orders: Value = buyer
        .get(format!("{}/api/account/orders", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["status"], "cancelled");

    // The cart survives so the shopper can retry
    let cart: Value = buyer
        .get(format!("{}/api/cart", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 2);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_credit_only_order_decrements_stock_and_balance() {
    let admin = admin_client().await;
    let product_id = create_product(&admin, "20.00", 4).await;

    // 3 000 requested, capped to the 2 000 the order needs
    let (_buyer, buyer_id, _order_id) = credit_only_order(&admin, product_id, 3_000).await;

    assert_eq!(stock_of(&admin, product_id).await, 3);
    assert_eq!(credits_of(&admin, buyer_id).await, 1_000);
}

// ============================================================================
// Back-office order changes
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_cancelling_paid_order_restocks_and_refunds() {
    let admin = admin_client().await;
    let product_id = create_product(&admin, "20.00", 4).await;
    let (buyer, buyer_id, order_id) = credit_only_order(&admin, product_id, 2_000).await;
    assert_eq!(stock_of(&admin, product_id).await, 3);
    assert_eq!(credits_of(&admin, buyer_id).await, 0);

    let resp = admin
        .patch(format!("{}/api/orders/{order_id}/status", admin_url()))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let change: Value = resp.json().await.unwrap();
    assert_eq!(change["from"], "paid");
    assert_eq!(change["restocked"], true);
    assert_eq!(change["credits_refunded"], 2_000);

    assert_eq!(stock_of(&admin, product_id).await, 4);
    assert_eq!(credits_of(&admin, buyer_id).await, 2_000);
    assert_eq!(order_status(&buyer, order_id).await, "cancelled");

    // Cancelled is terminal: a second cancel must not restock twice
    let resp = admin
        .patch(format!("{}/api/orders/{order_id}/status", admin_url()))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(stock_of(&admin, product_id).await, 4);
}

// ============================================================================
// Creator program
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_verification_bonus_then_commission_payout() {
    let admin = admin_client().await;
    let product_id = create_product(&admin, "50.00", 5).await;

    let (creator, creator_id) = register("creator").await;
    let coupon = make_creator(&admin, creator_id).await;
    let resp = admin
        .patch(format!("{}/api/creators/{creator_id}/tier", admin_url()))
        .json(&json!({ "tier": "elite" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = creator
        .post(format!("{}/api/creator/social-verifications", storefront_url()))
        .json(&json!({
            "platform": "instagram",
            "username": "@flow.test",
            "follower_count": 30_000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let request: Value = resp.json().await.unwrap();
    let request_id = request["id"].as_i64().unwrap();

    let approve_url = format!(
        "{}/api/social-verifications/{request_id}/approve",
        admin_url()
    );
    let resp = admin.post(&approve_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let approval: Value = resp.json().await.unwrap();
    assert_eq!(approval["payout_tier"], "established");
    // An Established verification never lowers an Elite creator
    assert_eq!(approval["creator_tier"], "elite");
    assert_eq!(approval["bonus_credits"], 1_500);
    assert_eq!(approval["balance"], 1_500);

    let resp = admin.post(&approve_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(credits_of(&admin, creator_id).await, 1_500);

    // $50 less the 10 % coupon is $45, paid with credits; 20 % commission is $9
    let (buyer, buyer_id) = register("buyer").await;
    grant(&admin, buyer_id, 4_500).await;
    add_to_cart(&buyer, product_id, 1).await;
    let resp = buyer
        .post(format!("{}/api/checkout", storefront_url()))
        .json(&json!({
            "shipping": shipping(),
            "payment_nonce": "unused",
            "coupon_code": coupon,
            "credits_to_redeem": 4_500,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let payout_url = format!("{}/api/creators/{creator_id}/payout", admin_url());
    let resp = admin.post(&payout_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let payout: Value = resp.json().await.unwrap();
    assert_eq!(payout["orders_paid"], 1);
    assert_eq!(dec(&payout["commission_total"]), Decimal::from(9));
    assert_eq!(payout["credits"], 900);
    assert_eq!(payout["new_balance"], 2_400);

    let resp = admin.post(&payout_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let creators: Value = admin
        .get(format!("{}/api/creators", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let summary = creators
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["user_id"] == creator_id)
        .expect("creator listed");
    assert_eq!(dec(&summary["commission_unpaid"]), Decimal::ZERO);
    assert_eq!(dec(&summary["commission_earned"]), Decimal::from(9));
}

// ============================================================================
// Payment webhooks
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and SW_TEST_WEBHOOK_SECRET"]
async fn test_failed_webhook_does_not_undo_a_paid_order() {
    let admin = admin_client().await;
    let product_id = create_product(&admin, "20.00", 2).await;
    let (buyer, buyer_id, order_id) = credit_only_order(&admin, product_id, 2_000).await;

    assert_eq!(send_webhook("transaction.failed", order_id).await, StatusCode::NO_CONTENT);

    assert_eq!(order_status(&buyer, order_id).await, "paid");
    assert_eq!(stock_of(&admin, product_id).await, 1);
    assert_eq!(credits_of(&admin, buyer_id).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and SW_TEST_WEBHOOK_SECRET"]
async fn test_settled_webhook_does_not_revive_a_cancelled_order() {
    let admin = admin_client().await;
    let product_id = create_product(&admin, "20.00", 2).await;
    let (buyer, _buyer_id, order_id) = credit_only_order(&admin, product_id, 2_000).await;

    let resp = admin
        .patch(format!("{}/api/orders/{order_id}/status", admin_url()))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(send_webhook("transaction.settled", order_id).await, StatusCode::NO_CONTENT);
    assert_eq!(order_status(&buyer, order_id).await, "cancelled");
    assert_eq!(stock_of(&admin, product_id).await, 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and SW_TEST_WEBHOOK_SECRET"]
async fn test_webhook_for_unknown_order_is_acknowledged() {
    assert_eq!(send_webhook("transaction.settled", i64::MAX).await, StatusCode::NO_CONTENT);
}
