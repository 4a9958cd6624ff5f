//! Email service for creator program notifications.
//!
//! Uses SMTP via lettre for delivery. Messages are plain text.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use solewave_core::tier::CreatorTier;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// What goes into a creator invitation email.
#[derive(Debug, Clone, Copy)]
pub struct InviteEmail<'a> {
    pub to: &'a str,
    pub tier: CreatorTier,
    pub coupon_code: &'a str,
    pub invite_url: &'a str,
    pub expires_in_days: i64,
}

impl InviteEmail<'_> {
    /// Subject line.
    #[must_use]
    pub const fn subject(&self) -> &'static str {
        "You're invited to the Solewave creator program"
    }

    /// Plain text body.
    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "Hi,\n\n\
             You've been invited to join the Solewave creator program at the {tier} tier \
             ({rate}% commission on every order placed with your code).\n\n\
             Your coupon code: {code}\n\n\
             Accept the invitation here:\n{url}\n\n\
             This link expires in {days} days.\n\n\
             The Solewave team\n",
            tier = self.tier,
            rate = (self.tier.commission_rate() * rust_decimal::Decimal::ONE_HUNDRED).normalize(),
            code = self.coupon_code,
            url = self.invite_url,
            days = self.expires_in_days,
        )
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a creator program invitation.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or delivered.
    pub async fn send_creator_invite(&self, invite: &InviteEmail<'_>) -> Result<(), EmailError> {
        self.send_text_email(invite.to, invite.subject(), &invite.body())
            .await
    }

    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_body_mentions_code_rate_and_link() {
        let email = InviteEmail {
            to: "jay@example.com",
            tier: CreatorTier::Established,
            coupon_code: "JAYKICKS7",
            invite_url: "https://solewave.shop/creator/invite/abc",
            expires_in_days: 14,
        };
        let body = email.body();
        assert!(body.contains("JAYKICKS7"));
        assert!(body.contains("15"));
        assert!(body.contains("https://solewave.shop/creator/invite/abc"));
        assert!(body.contains("14 days"));
    }
}
