//! Admin account management commands.
//!
//! Admins cannot be created over HTTP; the first one comes from here and
//! later ones can be promoted with `PATCH /api/users/{id}/role`.

use solewave_admin::services::AdminAuthService;

/// Create a new admin account.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, an existing
/// account or a database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Creating admin account: {}", email);
    let (user_id, created_at) = AdminAuthService::new(&pool)
        .create_admin(email, name, password)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}, Created: {}",
        user_id,
        email,
        created_at
    );
    Ok(())
}
