//! # pos-server: REST API for Ledger POS
//!
//! The HTTP surface consumed by the POS client.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Server                                      │
//! │                                                                         │
//! │  POS Client ───► HTTP/JSON ───► axum handlers ───► pos-db ───► SQLite  │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                        auth (argon2 + JWT sessions)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers are deliberately thin: validate, call the engine, map errors.
//! Everything stateful lives in [`AppState`], cloned per request.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use pos_db::Database;

/// Shared application state.
///
/// Cheap to clone: the database wraps a pool and the rest is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    /// Builds the state, deriving the JWT manager from config.
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_lifetime_secs,
        ));

        AppState {
            db,
            config: Arc::new(config),
            jwt,
        }
    }
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe: checks that the database answers queries.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable" })),
        )
    }
}

// =============================================================================
// Integration Tests
// =============================================================================
