//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Ledger POS                             │
//! │                                                                         │
//! │  Handler returns Result<T, ApiError>                                   │
//! │         │                                                               │
//! │         ├── DbError::NotFound ──────────► 404 NOT_FOUND                │
//! │         ├── DbError::UniqueViolation ───► 409 CONFLICT                 │
//! │         ├── CheckoutError::EmptyCart ───► 400 EMPTY_CART               │
//! │         ├── CheckoutError::              │                              │
//! │         │     InsufficientStock ────────► 409 INSUFFICIENT_STOCK       │
//! │         ├── ValidationError ────────────► 400 VALIDATION_ERROR         │
//! │         └── anything internal ──────────► 500 INTERNAL (opaque)        │
//! │                                                                         │
//! │  Body: { "code": "INSUFFICIENT_STOCK",                                 │
//! │          "message": "Not enough stock for product 1: ..." }            │
//! │                                                                         │
//! │  The client displays `message` raw, so messages are the stable         │
//! │  domain-error messages. Internal errors are logged with detail and     │
//! │  returned opaque - storage specifics never reach the wire.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use pos_core::{CoreError, ValidationError};
use pos_db::{CheckoutError, DbError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 7"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Uniqueness violation on sku/username/code (409)
    Conflict,

    /// Input validation failed (400)
    ValidationError,

    /// Checkout submitted with no lines (400)
    EmptyCart,

    /// Unknown, inactive, or expired discount code (400)
    InvalidDiscount,

    /// Requested quantity exceeds stock (409)
    InsufficientStock,

    /// Missing or bad credentials (401)
    Unauthorized,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::EmptyCart => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidDiscount => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error (message stays opaque to the client).
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { .. } => {
                // The DbError message is already the stable, user-facing form
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            DbError::Busy | DbError::PoolExhausted => {
                tracing::error!("Database contention exhausted retries");
                ApiError::internal("Service temporarily overloaded")
            }
            DbError::ConnectionFailed(e)
            | DbError::MigrationFailed(e)
            | DbError::QueryFailed(e)
            | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Database operation failed");
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Converts checkout errors to API errors.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, err.to_string()),
            CheckoutError::CartTooLarge { .. } => ApiError::validation(err.to_string()),
            CheckoutError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CheckoutError::InvalidDiscount(_) => {
                ApiError::new(ErrorCode::InvalidDiscount, err.to_string())
            }
            CheckoutError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CheckoutError::Validation(e) => ApiError::validation(e.to_string()),
            CheckoutError::Db(e) => e.into(),
        }
    }
}

/// Converts core validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, err.to_string()),
            CoreError::CartTooLarge { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::InsufficientStock.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_mapping_keeps_messages() {
        let err: ApiError = CheckoutError::InsufficientStock {
            product_id: 1,
            available: 2,
            requested: 3,
        }
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Not enough stock for product 1: available 2, requested 3"
        );
    }

    #[test]
    fn test_conflict_mapping() {
        let err: ApiError = DbError::duplicate("sku", "ABC-1").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "Duplicate sku: 'ABC-1' already exists");
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err: ApiError = DbError::QueryFailed("secret table layout detail".to_string()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("secret"));
    }
}
