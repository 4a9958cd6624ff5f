//! Creator invitation flow: coupon choice, token, storage and email.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use solewave_core::coupon::{CouponCode, CouponCodeError};
use solewave_core::tier::CreatorTier;
use solewave_core::{Email, EmailError as AddressError, UserId};

use crate::config::AdminConfig;
use crate::db::invites::NewInvite;
use crate::db::{InviteRepository, RepositoryError};
use crate::models::CreatorInvite;
use crate::services::email::{EmailService, InviteEmail};

/// Attempts at finding a free suggested coupon code.
const SUGGESTION_ATTEMPTS: u32 = 8;

/// Errors from creating an invitation.
#[derive(Debug, Error)]
pub enum InviteError {
    /// Invitee address is not a valid email.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] AddressError),

    /// Supplied coupon code is malformed.
    #[error("{0}")]
    InvalidCoupon(#[from] CouponCodeError),

    /// Supplied coupon code belongs to a creator or a pending invite.
    #[error("coupon code {0} is already in use")]
    CouponTaken(CouponCode),

    /// Every suggested code was taken.
    #[error("could not find a free coupon code; supply one")]
    NoFreeCoupon,

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A stored invitation and what happened to its email.
#[derive(Debug, Clone, Serialize)]
pub struct InviteCreated {
    pub invite: CreatorInvite,
    pub invite_url: String,
    pub email_sent: bool,
}

/// 32 random bytes as URL-safe base64 without padding.
#[must_use]
pub fn generate_invite_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Invitation service.
pub struct InviteService<'a> {
    invites: InviteRepository<'a>,
    email: &'a EmailService,
    config: &'a AdminConfig,
}

impl<'a> InviteService<'a> {
    /// Create a new invite service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService, config: &'a AdminConfig) -> Self {
        Self {
            invites: InviteRepository::new(pool),
            email,
            config,
        }
    }

    /// Store an invitation and email it.
    ///
    /// A failed email is logged and reported through `email_sent`; the
    /// invitation stays valid and its link can be shared by hand.
    ///
    /// # Errors
    ///
    /// Returns `InviteError` for an invalid email or coupon, a coupon already
    /// in use, or a database failure.
    pub async fn create(
        &self,
        invited_by: UserId,
        email: &str,
        tier: CreatorTier,
        coupon_code: Option<&str>,
    ) -> Result<InviteCreated, InviteError> {
        let email = Email::parse(email)?;
        let coupon_code = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let code = CouponCode::parse(code)?;
                if self.invites.coupon_taken(&code).await? {
                    return Err(InviteError::CouponTaken(code));
                }
                code
            }
            None => self.suggest_coupon(&email).await?,
        };

        let token = generate_invite_token();
        let ttl_days = self.config.creator_program.invite_ttl_days;
        let invite = self
            .invites
            .create(&NewInvite {
                email: &email,
                tier,
                coupon_code: &coupon_code,
                token: &token,
                expires_at: Utc::now() + Duration::days(ttl_days),
                invited_by,
            })
            .await?;

        let invite_url = self.config.invite_url(&token);
        let email_sent = match self
            .email
            .send_creator_invite(&InviteEmail {
                to: email.as_str(),
                tier,
                coupon_code: coupon_code.as_str(),
                invite_url: &invite_url,
                expires_in_days: ttl_days,
            })
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, invite_id = %invite.id, "Failed to send creator invite email");
                false
            }
        };

        tracing::info!(
            invite_id = %invite.id,
            tier = %tier,
            coupon = %coupon_code,
            email_sent,
            "Creator invite created"
        );

        Ok(InviteCreated {
            invite,
            invite_url,
            email_sent,
        })
    }

    async fn suggest_coupon(&self, email: &Email) -> Result<CouponCode, InviteError> {
        for _ in 0..SUGGESTION_ATTEMPTS {
            let suffix = rand::rng().random_range(10..10_000);
            let code = CouponCode::suggest(email.local_part(), suffix);
            if !self.invites.coupon_taken(&code).await? {
                return Ok(code);
            }
        }
        Err(InviteError::NoFreeCoupon)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_token_is_32_bytes_url_safe() {
        let token = generate_invite_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), 32);
    }

    #[test]
    fn test_invite_tokens_differ() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }
}
