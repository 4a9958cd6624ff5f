//! Database migration command.
//!
//! Runs the SQL migrations in the workspace `migrations/` directory, then
//! creates the storefront (`tower_sessions.session`) and admin
//! (`tower_sessions.admin_session`) session tables.

use tower_sessions_sqlx_store::PostgresStore;

use solewave_admin::middleware::session::session_store;

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running SQL migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Creating admin session table...");
    session_store(&pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
