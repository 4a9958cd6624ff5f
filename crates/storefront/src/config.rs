//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Cookie signing secret (min 32 chars, high entropy)
//! - `PAYMENT_GATEWAY_URL` - Base URL of the payment gateway API
//! - `PAYMENT_MERCHANT_ID` - Gateway merchant identifier
//! - `PAYMENT_PRIVATE_KEY` - Gateway private key (high entropy)
//! - `PAYMENT_WEBHOOK_SECRET` - Shared secret for webhook signatures (high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_UPLOAD_DIR` - Avatar upload directory (default: uploads)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sampling (default: 0.1)

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use thiserror::Error;
use tower_sessions::cookie::Key;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a value as copied from a template rather than generated.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Secret the session cookie is signed with
    pub session_secret: SecretString,
    pub payment: PaymentConfig,
    /// Directory avatar uploads are written to
    pub upload_dir: PathBuf,
    pub sentry: SentryConfig,
}

/// Payment gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway API base URL, without trailing slash
    pub base_url: String,
    /// Merchant identifier (basic auth user)
    pub merchant_id: String,
    /// Private key (basic auth password)
    pub private_key: SecretString,
    /// HMAC key for incoming webhooks
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .field("private_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// Sentry client settings. Error tracking is off without a DSN.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    /// Fraction of requests traced; checkout traffic makes full tracing costly.
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            traces_sample_rate: 0.1,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: database_url("STOREFRONT_DATABASE_URL")?,
            host: parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or("STOREFRONT_PORT", 3000)?,
            base_url: required_url("STOREFRONT_BASE_URL")?,
            session_secret: session_secret("STOREFRONT_SESSION_SECRET")?,
            payment: PaymentConfig::from_env()?,
            upload_dir: parse_or("STOREFRONT_UPLOAD_DIR", PathBuf::from("uploads"))?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Key the session cookie is signed with, stretched to 64 bytes.
    #[must_use]
    pub fn cookie_key(&self) -> Key {
        Key::from(Sha512::digest(self.session_secret.expose_secret().as_bytes()).as_slice())
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = required_url("PAYMENT_GATEWAY_URL")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            merchant_id: required("PAYMENT_MERCHANT_ID")?,
            private_key: secret("PAYMENT_PRIVATE_KEY")?,
            webhook_secret: secret("PAYMENT_WEBHOOK_SECRET")?,
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: optional("SENTRY_DSN"),
            environment: optional("SENTRY_ENVIRONMENT"),
            traces_sample_rate: parse_or(
                "SENTRY_TRACES_SAMPLE_RATE",
                Self::default().traces_sample_rate,
            )?,
        })
    }
}

// =============================================================================
// Environment readers
// =============================================================================

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Unset and empty are treated alike.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required_url(key: &str) -> Result<String, ConfigError> {
    let value = required(key)?;
    url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value)
}

/// Parse `key`, or fall back to `default` when unset.
fn parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    optional(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// `primary` first, then the generic `DATABASE_URL` set by `fly postgres attach`.
fn database_url(primary: &str) -> Result<SecretString, ConfigError> {
    optional(primary)
        .or_else(|| optional("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary.to_string()))
}

/// A secret that must look randomly generated.
fn secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    check_secret_strength(&value)
        .map_err(|reason| ConfigError::InsecureSecret(key.to_string(), reason))?;
    Ok(SecretString::from(value))
}

/// A secret long enough to derive the cookie signing key from.
fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = secret(key)?;
    let len = value.expose_secret().len();
    if len < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {len})"),
        ));
    }
    Ok(value)
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .into_values()
        .map(|n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

/// Rejects template placeholders and low-entropy values.
fn check_secret_strength(value: &str) -> Result<(), String> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); \
             generate one with `openssl rand -base64 48`"
        ));
    }
    Ok(())
}
