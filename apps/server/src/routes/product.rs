//! # Product Routes
//!
//! Catalog CRUD. Stock mutation through this surface is the admin path
//! (direct set); checkout deducts stock through the engine only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;
use pos_core::validation::{validate_price, validate_product_name, validate_sku, validate_stock};
use pos_core::{Money, Product};
use pos_db::repository::product::{NewProduct, ProductPatch};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub quantity: i64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
    pub description: Option<String>,
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.db.products().list().await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(product))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_sku(&payload.sku)?;
    validate_product_name(&payload.name)?;
    validate_price(payload.price)?;
    validate_stock(payload.quantity)?;

    let product = state
        .db
        .products()
        .create(NewProduct {
            sku: payload.sku,
            name: payload.name,
            description: payload.description,
            price: payload.price,
            quantity: payload.quantity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    if let Some(ref sku) = payload.sku {
        validate_sku(sku)?;
    }
    if let Some(ref name) = payload.name {
        validate_product_name(name)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(quantity) = payload.quantity {
        validate_stock(quantity)?;
    }

    let product = state
        .db
        .products()
        .update(
            id,
            ProductPatch {
                sku: payload.sku,
                name: payload.name,
                description: payload.description,
                price: payload.price,
                quantity: payload.quantity,
            },
        )
        .await?;

    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}
