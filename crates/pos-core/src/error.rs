//! # Error Types
//!
//! Domain-specific error types for pos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pos-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pos-db errors (separate crate)                                        │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - Checkout transaction failures                  │
//! │                                                                         │
//! │  HTTP API errors (in server app)                                       │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError → Client │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, product id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a stable user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations raised before any
/// persistence happens. They are surfaced verbatim to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A checkout was submitted with no lines.
    ///
    /// ## When This Occurs
    /// - Client sends `items: []` (or omits the field)
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date, bad characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
