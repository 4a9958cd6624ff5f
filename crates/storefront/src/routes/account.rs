//! Account route handlers: profile, avatar and order history.

use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Deserialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use solewave_core::OrderId;

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderSummary, Profile};
use crate::services::auth::validate_display_name;
use crate::state::AppState;

/// Largest accepted avatar, in bytes.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// URL prefix uploaded files are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// `PATCH /api/account/profile` body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `GET /api/account/profile`
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = UserRepository::new(state.pool())
        .get_profile(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// `PATCH /api/account/profile`
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<Profile>> {
    let users = UserRepository::new(state.pool());
    let profile = match body.display_name {
        Some(name) => {
            let name = validate_display_name(&name)?;
            users.update_display_name(user.id, &name).await?
        }
        None => users
            .get_profile(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?,
    };
    Ok(Json(profile))
}

/// File extension for a supported image, sniffed from its leading bytes.
#[must_use]
pub fn detect_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]) {
        Some("webp")
    } else {
        None
    }
}

/// `POST /api/account/avatar`
///
/// Multipart field `file`: PNG, JPEG or WebP, at most 2 MiB. The file is
/// written first; if the profile update then fails, the file is removed.
#[instrument(skip(state, multipart), fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut multipart: Multipart,
) -> Result<Json<Profile>> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            data = Some(bytes);
            break;
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::BadRequest("Avatar must be at most 2 MiB".to_string()));
    }
    let ext = detect_image(&data)
        .ok_or_else(|| AppError::BadRequest("Avatar must be PNG, JPEG or WebP".to_string()))?;

    let upload_dir = &state.config().upload_dir;
    let file_name = format!("avatar-{}-{}.{ext}", user.id, Uuid::new_v4());
    let path = upload_dir.join(&file_name);

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("create upload dir: {e}")))?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| AppError::Internal(format!("write avatar: {e}")))?;

    let users = UserRepository::new(state.pool());
    let previous = users
        .get_profile(user.id)
        .await
        .ok()
        .flatten()
        .and_then(|p| p.avatar_url);

    let url = format!("{UPLOADS_URL_PREFIX}/{file_name}");
    let profile = match users.update_avatar(user.id, &url).await {
        Ok(profile) => profile,
        Err(e) => {
            remove_quietly(&path).await;
            return Err(e.into());
        }
    };

    if let Some(old) = previous
        .as_deref()
        .and_then(|u| u.strip_prefix(UPLOADS_URL_PREFIX))
        .map(|name| name.trim_start_matches('/'))
        .filter(|name| !name.is_empty() && !name.contains(['/', '\\']))
    {
        remove_quietly(&upload_dir.join(old)).await;
    }

    Ok(Json(profile))
}

async fn remove_quietly(path: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove avatar file");
    }
}

/// `GET /api/account/orders`
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/account/orders/{id}`
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(user.id, OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_image() {
        assert_eq!(detect_image(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), Some("png"));
        assert_eq!(detect_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), Some("jpg"));
        assert_eq!(detect_image(b"RIFF\x24\0\0\0WEBPVP8 "), Some("webp"));
        assert_eq!(detect_image(b"RIFF\x24\0\0\0WAVEfmt "), None);
        assert_eq!(detect_image(b"GIF89a"), None);
        assert_eq!(detect_image(b""), None);
    }
}
