//! # pos-core: Pure Business Logic for Ledger POS
//!
//! This crate is the **heart** of the Ledger POS engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  REST API (apps/server)                         │   │
//! │  │    /api/products ── /api/sales ── /api/reports/sales           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                pos-db (Database + Checkout Engine)              │   │
//! │  │    repositories, migrations, CheckoutProcessor                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ★ pos-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │   cart    │  │   │
//! │  │   │  Product  │  │   Money   │  │   Quote   │  │ CartLine  │  │   │
//! │  │   │   Sale    │  │  (cents)  │  │ discounts │  │ normalize │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Discount, Sale, Customer, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Request-scoped cart value object
//! - [`pricing`] - Pure pricing and discount application
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use pos_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(10_000); // $100.00
//!
//! // 10% off in basis points (1000 bps = 10%)
//! let discounted = price.apply_percentage_discount(1_000);
//! assert_eq!(discounted.cents(), 9_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pos_core::Money` instead of
// `use pos_core::money::Money`

pub use cart::{Cart, CartLine};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use pricing::{price_cart, PricedLine, Quote};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single checkout cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_LINE_QUANTITY: i64 = 999;
