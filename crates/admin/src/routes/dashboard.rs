//! Dashboard route handler.

use axum::{Json, extract::State};

use crate::db::AnalyticsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::Dashboard;
use crate::state::AppState;

/// `GET /api/dashboard`
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Dashboard>> {
    let dashboard = AnalyticsRepository::new(state.pool()).dashboard().await?;
    Ok(Json(dashboard))
}
