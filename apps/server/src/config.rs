//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults suitable for local development.

use serde::{Deserialize, Serialize};
use std::env;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// JWT secret key for signing session tokens
    pub jwt_secret: String,

    /// JWT token lifetime in seconds
    pub jwt_lifetime_secs: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./pos.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback only.
                // In production, this MUST be set via environment variable
                "ledger-pos-dev-secret-change-in-production".to_string()
            }),

            jwt_lifetime_secs: env::var("JWT_LIFETIME_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()))?,
        };

        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
