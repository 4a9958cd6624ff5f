//! Admin authentication service.
//!
//! Admins are ordinary accounts with the `admin` role. They log in with the
//! same Argon2id password hashes the storefront writes; any other role is
//! refused with the same error as a wrong password.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use solewave_core::{Email, Role, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::models::CurrentAdmin;

/// Minimum password length for admin accounts.
const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length (bounds hashing cost).
const MAX_PASSWORD_LENGTH: usize = 256;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown email, a
    /// wrong password, or an account that is not an admin.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentAdmin, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let candidate = self
            .users
            .get_login(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &candidate.password_hash)?;

        if candidate.role != Role::Admin {
            tracing::warn!(user_id = %candidate.admin.id, "Non-admin login attempt");
            return Err(AdminAuthError::InvalidCredentials);
        }

        Ok(candidate.admin)
    }

    /// Create an admin account (CLI bootstrap).
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AdminAuthError::WeakPassword` if the password is too short.
    pub async fn create_admin(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<(UserId, DateTime<Utc>), AdminAuthError> {
        let email = Email::parse(email)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AdminAuthError::MissingDisplayName);
        }
        validate_password(password)?;
        let hash = hash_password(password)?;

        self.users
            .create_admin(&email, &hash, display_name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
                other => AdminAuthError::Repository(other),
            })
    }
}

/// Check admin password length rules.
///
/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` describing the failed rule.
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_password_is_longer_than_customer_minimum() {
        assert!(validate_password("eight888").is_err());
        assert!(validate_password("twelve-chars").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("back office key").unwrap();
        assert!(verify_password("back office key", &hash).is_ok());
        assert!(matches!(
            verify_password("front office key", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }
}
