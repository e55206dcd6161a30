//! # Sale Routes
//!
//! `POST /` is the checkout endpoint - the one write path into the
//! transaction engine. Reads return the append-only sale records.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;
use pos_core::{CartLine, PaymentMethod, Sale};
use pos_db::checkout::CheckoutRequest;

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub user_id: i64,
    pub customer_id: Option<i64>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub discount_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSaleResponse {
    pub sale_id: i64,
}

async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<CreateSaleResponse>), ApiError> {
    let receipt = state
        .db
        .checkout()
        .process(CheckoutRequest {
            user_id: payload.user_id,
            customer_id: payload.customer_id,
            payment_method: payload.payment_method,
            lines: payload.items,
            discount_codes: payload.discount_codes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSaleResponse {
            sale_id: receipt.sale_id,
        }),
    ))
}

async fn list_sales(State(state): State<AppState>) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(state.db.sales().list().await?))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Sale>, ApiError> {
    let sale = state
        .db
        .sales()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))?;

    Ok(Json(sale))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/:id", get(get_sale))
}
