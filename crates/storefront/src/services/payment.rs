//! Payment gateway client.
//!
//! Card data never reaches this service. The browser drop-in exchanges a
//! client token for a single-use payment nonce, and the storefront charges that
//! nonce server-side with the merchant's private key.
//!
//! # Endpoints
//!
//! - `POST {base}/client_token` -> `{ "client_token": "..." }`
//! - `POST {base}/transactions` `{ amount, payment_method_nonce, reference }`
//!   -> `{ "id": "...", "status": "settled" | "authorized" | ... }`
//!
//! Both use HTTP basic auth with `merchant_id:private_key`.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

use crate::config::PaymentConfig;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    /// The charge was processed but not approved.
    #[error("payment declined ({status})")]
    Declined { status: String },
}

/// Result of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Charge {
    /// Gateway transaction id.
    pub id: String,
    /// Gateway status, e.g. `settled`.
    pub status: String,
}

impl Charge {
    /// Whether the gateway accepted the charge.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "settled" | "authorized" | "submitted_for_settlement")
    }
}

#[derive(Debug, Deserialize)]
struct ClientTokenResponse {
    client_token: String,
}

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    amount: Decimal,
    payment_method_nonce: &'a str,
    reference: &'a str,
}

/// HTTP client for the payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    inner: Arc<PaymentGatewayInner>,
}

struct PaymentGatewayInner {
    client: reqwest::Client,
    base_url: String,
    merchant_id: String,
    private_key: SecretString,
    webhook_secret: SecretString,
}

impl PaymentGateway {
    /// Create a gateway client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            inner: Arc::new(PaymentGatewayInner {
                client,
                base_url: config.base_url.clone(),
                merchant_id: config.merchant_id.clone(),
                private_key: config.private_key.clone(),
                webhook_secret: config.webhook_secret.clone(),
            }),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .post(format!("{}/{path}", self.inner.base_url))
            .basic_auth(
                &self.inner.merchant_id,
                Some(self.inner.private_key.expose_secret()),
            )
    }

    /// Ask the gateway for a client token for the browser drop-in.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the request fails.
    #[instrument(skip(self))]
    pub async fn client_token(&self) -> Result<String, PaymentError> {
        let response = self.post("client_token").send().await?;
        let response = check_status(response).await?;
        let body: ClientTokenResponse = response.json().await?;
        Ok(body.client_token)
    }

    /// Charge a payment nonce.
    ///
    /// `reference` is echoed back in webhooks (the order id or wallet reference).
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Declined` if the gateway did not approve the
    /// charge, or another `PaymentError` if the request failed.
    #[instrument(skip(self, nonce), fields(amount = %amount))]
    pub async fn charge(
        &self,
        amount: Decimal,
        nonce: &str,
        reference: &str,
    ) -> Result<Charge, PaymentError> {
        let response = self
            .post("transactions")
            .json(&ChargeRequest {
                amount,
                payment_method_nonce: nonce,
                reference,
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let charge: Charge = response.json().await?;

        if !charge.is_success() {
            return Err(PaymentError::Declined {
                status: charge.status,
            });
        }
        Ok(charge)
    }

    /// Check a webhook signature against the configured secret.
    #[must_use]
    pub fn verify_webhook(&self, body: &[u8], signature_hex: &str) -> bool {
        verify_signature(
            self.inner.webhook_secret.expose_secret().as_bytes(),
            body,
            signature_hex,
        )
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PaymentError::Gateway {
        status: status.as_u16(),
        body,
    })
}

/// Verify a hex HMAC-SHA256 `signature_hex` of `body` under `secret`.
///
/// Comparison is constant-time.
#[must_use]
pub fn verify_signature(secret: &[u8], body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA256 of `body` under `secret`, as the gateway sends it.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any length.
#[must_use]
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whk_7Qz1Lp9Xc4Vb";

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"event":"transaction.settled","order_id":42}"#;
        let sig = sign(SECRET, body);
        assert!(verify_signature(SECRET, body, &sig));
        assert!(verify_signature(SECRET, body, &sig.to_uppercase()));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let body = br#"{"event":"transaction.settled","order_id":42}"#;
        let sig = sign(SECRET, body);
        assert!(!verify_signature(SECRET, br#"{"event":"transaction.settled","order_id":43}"#, &sig));
        assert!(!verify_signature(b"other-secret", body, &sig));
        assert!(!verify_signature(SECRET, body, "not-hex"));
        assert!(!verify_signature(SECRET, body, ""));
    }

    #[test]
    fn test_charge_success_statuses() {
        let charge = |status: &str| Charge {
            id: "txn_1".to_string(),
            status: status.to_string(),
        };
        assert!(charge("settled").is_success());
        assert!(charge("authorized").is_success());
        assert!(!charge("processor_declined").is_success());
        assert!(!charge("gateway_rejected").is_success());
    }
}
