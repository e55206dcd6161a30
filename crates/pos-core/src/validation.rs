//! # Validation Module
//!
//! Input validation utilities for Ledger POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (serde)                                         │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Shape of the payload                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  ├── CHECK (quantity >= 0), CHECK (price_cents >= 0)                   │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DiscountKind;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use pos_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a customer name (same rules as product names).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_product_name(name)
}

/// Validates a username.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 3 and 50 characters
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a raw password before hashing.
///
/// ## Rules
/// - Must be at least 8 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    Ok(())
}

/// Validates a user role.
pub fn validate_role(role: &str) -> ValidationResult<()> {
    const ALLOWED: [&str; 3] = ["cashier", "manager", "admin"];

    if ALLOWED.contains(&role) {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            field: "role".to_string(),
            allowed: ALLOWED.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Validates a discount code string.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
pub fn validate_discount_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level supplied on product create/update.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero means out of stock
pub fn validate_stock(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a product price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount value in its internal encoding.
///
/// ## Rules
/// - Percentage: 1..=10000 basis points (0% exclusive to 100% inclusive)
/// - FixedAmount: positive cents
pub fn validate_discount_value(kind: DiscountKind, value: i64) -> ValidationResult<()> {
    match kind {
        DiscountKind::Percentage => {
            if !(1..=10_000).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 1,
                    max: 10_000,
                });
            }
        }
        DiscountKind::FixedAmount => {
            if value <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
