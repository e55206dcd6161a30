//! # pos-db: Database Layer + Checkout Engine for Ledger POS
//!
//! This crate provides database access and the checkout transaction engine.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger POS Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      pos-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   Checkout   │  │   │
//! │  │   │   (pool.rs)   │    │ (product.rs,  │    │  Processor   │  │   │
//! │  │   │               │    │  sale.rs ...) │    │(checkout.rs) │  │   │
//! │  │   │ SqlitePool    │◄───│ CRUD + stock  │◄───│ atomic sale  │  │   │
//! │  │   │ + migrations  │    │ deduction     │    │ transaction  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                   SQLite Database (WAL mode)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, discount, sale, ...)
//! - [`checkout`] - The atomic checkout transaction processor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pos_db::{Database, DbConfig};
//! use pos_db::checkout::CheckoutRequest;
//! use pos_core::{CartLine, PaymentMethod};
//!
//! let db = Database::new(DbConfig::new("path/to/pos.db")).await?;
//!
//! let receipt = db
//!     .checkout()
//!     .process(CheckoutRequest {
//!         user_id: 1,
//!         customer_id: None,
//!         payment_method: PaymentMethod::Cash,
//!         lines: vec![CartLine { product_id: 1, quantity: 3 }],
//!         discount_codes: vec![],
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutError, CheckoutProcessor, CheckoutReceipt, CheckoutRequest};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::discount::DiscountRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
