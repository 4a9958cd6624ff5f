//! Creator program administration route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::info;

use solewave_core::UserId;
use solewave_core::coupon::{CouponCode, MAX_DISCOUNT_PERCENT};
use solewave_core::tier::CreatorTier;

use super::audit;
use crate::db::CreatorRepository;
use crate::db::creators::CouponChange;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CreatorSummary, Payout, Profile};
use crate::state::AppState;

/// `PATCH /api/creators/{id}/tier` body.
#[derive(Deserialize)]
pub struct TierRequest {
    pub tier: CreatorTier,
}

/// `PATCH /api/creators/{id}/coupon` body.
///
/// `code` absent keeps the current code, `code: null` removes it.
#[derive(Debug, Default, Deserialize)]
pub struct CouponRequest {
    #[serde(default, deserialize_with = "present")]
    pub code: Option<Option<String>>,
    pub discount_percent: Option<i32>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl CouponRequest {
    fn change(&self) -> Result<CouponChange> {
        match &self.code {
            None => Ok(CouponChange::Keep),
            Some(None) => Ok(CouponChange::Clear),
            Some(Some(code)) => CouponCode::parse(code)
                .map(CouponChange::Set)
                .map_err(|e| AppError::BadRequest(e.to_string())),
        }
    }

    fn discount(&self) -> Result<Option<i32>> {
        match self.discount_percent {
            Some(p) if !(0..=MAX_DISCOUNT_PERCENT).contains(&p) => Err(AppError::BadRequest(
                format!("discount_percent must be between 0 and {MAX_DISCOUNT_PERCENT}"),
            )),
            other => Ok(other),
        }
    }
}

/// `GET /api/creators`
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<CreatorSummary>>> {
    let creators = CreatorRepository::new(state.pool()).list().await?;
    Ok(Json(creators))
}

/// `PATCH /api/creators/{id}/tier`
pub async fn set_tier(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<TierRequest>,
) -> Result<Json<Profile>> {
    let profile = CreatorRepository::new(state.pool())
        .set_tier(id, body.tier)
        .await?;

    info!(user_id = %id, tier = %body.tier, "Creator tier changed");
    audit(
        &state,
        &admin,
        "creator.tier",
        &format!("user:{id}"),
        json!({ "tier": body.tier, "commission_rate": profile.commission_rate }),
    )
    .await;

    Ok(Json(profile))
}

/// `PATCH /api/creators/{id}/coupon`
pub async fn set_coupon(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<CouponRequest>,
) -> Result<Json<Profile>> {
    let change = body.change()?;
    let discount = body.discount()?;
    if change == CouponChange::Keep && discount.is_none() {
        return Err(AppError::BadRequest("nothing to change".to_string()));
    }

    let profile = CreatorRepository::new(state.pool())
        .set_coupon(id, &change, discount)
        .await?;

    info!(user_id = %id, coupon = ?profile.coupon_code, "Creator coupon changed");
    audit(
        &state,
        &admin,
        "creator.coupon",
        &format!("user:{id}"),
        json!({
            "coupon_code": profile.coupon_code,
            "discount_percent": profile.coupon_discount_percent,
        }),
    )
    .await;

    Ok(Json(profile))
}

/// `POST /api/creators/{id}/payout`
pub async fn payout(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<Payout>> {
    let payout = CreatorRepository::new(state.pool()).payout(id).await?;

    info!(
        user_id = %id,
        orders = payout.orders_paid,
        commission = %payout.commission_total,
        credits = payout.credits,
        "Commission paid out"
    );
    audit(
        &state,
        &admin,
        "creator.payout",
        &format!("user:{id}"),
        json!({
            "orders_paid": payout.orders_paid,
            "commission_total": payout.commission_total,
            "credits": payout.credits,
        }),
    )
    .await;

    Ok(Json(payout))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(body: &str) -> CouponRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_missing_code_keeps_current() {
        let req = parse(r#"{"discount_percent":15}"#);
        assert_eq!(req.change().unwrap(), CouponChange::Keep);
        assert_eq!(req.discount().unwrap(), Some(15));
    }

    #[test]
    fn test_null_code_clears() {
        assert_eq!(parse(r#"{"code":null}"#).change().unwrap(), CouponChange::Clear);
    }

    #[test]
    fn test_code_is_normalized() {
        assert_eq!(
            parse(r#"{"code":" kicksbyjay "}"#).change().unwrap(),
            CouponChange::Set(CouponCode::parse("KICKSBYJAY").unwrap())
        );
        assert!(parse(r#"{"code":"no spaces"}"#).change().is_err());
    }

    #[test]
    fn test_discount_bounds() {
        assert!(parse(r#"{"discount_percent":51}"#).discount().is_err());
        assert!(parse(r#"{"discount_percent":-1}"#).discount().is_err());
        assert_eq!(parse(r#"{"discount_percent":0}"#).discount().unwrap(), Some(0));
    }
}
