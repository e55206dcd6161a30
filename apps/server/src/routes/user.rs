//! # User Routes
//!
//! Registration, login, and account administration. This is the credential
//! boundary: raw passwords stop here (hashed via [`crate::auth`]), and a
//! successful login hands back the `user_id` + token the rest of the API
//! expects.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::AppState;
use pos_core::validation::{validate_password, validate_role, validate_username};
use pos_core::User;
use pos_db::repository::user::NewUser;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub role: String,
    pub token: String,
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegisterUserResponse>), ApiError> {
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let role = payload.role.unwrap_or_else(|| "cashier".to_string());
    validate_role(&role)?;

    let password_hash = hash_password(&payload.password)?;

    let user = state
        .db
        .users()
        .create(NewUser {
            username: payload.username,
            password_hash,
            role,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse { user_id: user.id }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // One failure message for both unknown user and wrong password, so the
    // endpoint can't be used to probe usernames
    let user = state
        .db
        .users()
        .get_by_username(&payload.username)
        .await?
        .filter(|u| verify_password(&payload.password, &u.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let token = state.jwt.generate_token(user.id, &user.username, &user.role)?;

    info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        user_id: user.id,
        role: user.role,
        token,
    }))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    // Hashes are skipped by User's serde derive
    Ok(Json(state.db.users().list().await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .route("/", get(list_users))
        .route("/:id", axum::routing::delete(delete_user))
}
