//! # Discount Routes
//!
//! Discount code CRUD.
//!
//! ## Value Conversion
//! The wire form carries `value` as a decimal number: `10.5` means 10.5%
//! for percentage codes and $10.50 for fixed-amount codes. Internally both
//! become integer hundredths (basis points / cents), so the conversion is
//! `round(value × 100)` in and `value ÷ 100` out, and the engine never does
//! float math on discounts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;
use pos_core::validation::{validate_discount_code, validate_discount_value};
use pos_core::{Discount, DiscountKind};
use pos_db::repository::discount::{DiscountPatch, NewDiscount};

#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    pub code: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    /// Decimal: percent for percentage codes, major units for fixed codes.
    pub value: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateDiscountRequest {
    pub description: Option<String>,
    /// kind and value must be updated together; see handler.
    pub kind: Option<DiscountKind>,
    pub value: Option<f64>,
    pub is_active: Option<bool>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Wire form of a discount, with `value` back in decimal.
#[derive(Debug, Serialize)]
pub struct DiscountDto {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    pub value: f64,
    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Discount> for DiscountDto {
    fn from(d: Discount) -> Self {
        DiscountDto {
            id: d.id,
            code: d.code,
            description: d.description,
            kind: d.kind,
            value: d.value as f64 / 100.0,
            is_active: d.is_active,
            valid_from: d.valid_from,
            valid_until: d.valid_until,
            created_at: d.created_at,
        }
    }
}

/// Decimal wire value → internal hundredths, bounds-checked.
fn encode_value(kind: DiscountKind, value: f64) -> Result<i64, ApiError> {
    if !value.is_finite() {
        return Err(ApiError::validation("value must be a finite number"));
    }
    let internal = (value * 100.0).round() as i64;
    validate_discount_value(kind, internal)?;
    Ok(internal)
}

async fn list_discounts(State(state): State<AppState>) -> Result<Json<Vec<DiscountDto>>, ApiError> {
    let discounts = state.db.discounts().list().await?;
    Ok(Json(discounts.into_iter().map(DiscountDto::from).collect()))
}

async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DiscountDto>, ApiError> {
    let discount = state
        .db
        .discounts()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Discount", id))?;

    Ok(Json(discount.into()))
}

async fn create_discount(
    State(state): State<AppState>,
    Json(payload): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<DiscountDto>), ApiError> {
    validate_discount_code(&payload.code)?;
    let value = encode_value(payload.kind, payload.value)?;

    let discount = state
        .db
        .discounts()
        .create(NewDiscount {
            code: payload.code,
            description: payload.description,
            kind: payload.kind,
            value,
            is_active: payload.is_active,
            valid_from: payload.valid_from,
            valid_until: payload.valid_until,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(discount.into())))
}

async fn update_discount(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> Result<Json<DiscountDto>, ApiError> {
    // The value's unit depends on the kind, so changing one without the
    // other would silently reinterpret the stored value
    let (kind, value) = match (payload.kind, payload.value) {
        (Some(kind), Some(value)) => (Some(kind), Some(encode_value(kind, value)?)),
        (None, None) => (None, None),
        _ => {
            return Err(ApiError::validation(
                "kind and value must be updated together",
            ))
        }
    };

    let discount = state
        .db
        .discounts()
        .update(
            id,
            DiscountPatch {
                description: payload.description,
                kind,
                value,
                is_active: payload.is_active,
                valid_from: payload.valid_from,
                valid_until: payload.valid_until,
            },
        )
        .await?;

    Ok(Json(discount.into()))
}

async fn delete_discount(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.discounts().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route(
            "/:id",
            get(get_discount)
                .put(update_discount)
                .delete(delete_discount),
        )
}
