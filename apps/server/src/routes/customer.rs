//! # Customer Routes

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;
use pos_core::validation::validate_customer_name;
use pos_core::Customer;
use pos_db::repository::customer::{CustomerPatch, NewCustomer};

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.db.customers().list().await?))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state
        .db
        .customers()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;

    Ok(Json(customer))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    validate_customer_name(&payload.name)?;

    let customer = state
        .db
        .customers()
        .create(NewCustomer {
            name: payload.name,
            phone_number: payload.phone_number,
            email: payload.email,
            address: payload.address,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    if let Some(ref name) = payload.name {
        validate_customer_name(name)?;
    }

    let customer = state
        .db
        .customers()
        .update(
            id,
            CustomerPatch {
                name: payload.name,
                phone_number: payload.phone_number,
                email: payload.email,
                address: payload.address,
            },
        )
        .await?;

    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.customers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}
