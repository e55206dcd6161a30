//! # Domain Types
//!
//! Core domain types used throughout Ledger POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Discount     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  sku (unique)   │   │  total_amount   │   │  code (unique)  │       │
//! │  │  price (Money)  │   │  final_amount   │   │  kind + value   │       │
//! │  │  quantity       │   │  items          │   │  validity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   SaleItem      │   │ PaymentMethod   │   │  DiscountKind   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  unit_price     │   │  Cash           │   │  Percentage     │       │
//! │  │  (snapshot)     │   │  CreditCard     │   │  FixedAmount    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A SaleItem freezes the product's sku, name, and unit price at checkout
//! time. Later catalog edits or deletes never alter historical sales; the
//! product reference (`product_id`) is deliberately weak.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Stock (`quantity`) lives on the product row; the catalog is the single
/// authority for stock levels. It is mutated only by admin create/update and
/// by the checkout engine's conditional decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (database rowid).
    pub id: i64,

    /// Stock Keeping Unit - unique business identifier.
    pub sku: String,

    /// Display name shown to cashier and in reports.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Unit price. Never negative.
    pub price: Money,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount code reduces the running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Multiplies the running amount by (1 - value).
    Percentage,
    /// Subtracts a fixed amount from the running total.
    FixedAmount,
}

/// A named discount code.
///
/// ## Value Encoding
/// `value` is stored in the unit natural to the kind:
/// - `Percentage`: basis points (1000 = 10%)
/// - `FixedAmount`: cents (500 = $5.00)
///
/// The API layer converts to/from the decimal wire form (10.0 / 5.0); the
/// engine never does float math on discount values.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Discount {
    pub id: i64,
    /// Unique, caller-facing code (e.g. "SUMMER10").
    pub code: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    /// Basis points for percentage codes, cents for fixed-amount codes.
    pub value: i64,
    pub is_active: bool,
    /// Start of the validity window (inclusive); open when absent.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window (inclusive); open when absent.
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Whether the code can be redeemed at `now`.
    ///
    /// A code must be active AND inside its validity window. A code outside
    /// either bound resolves exactly like an unknown code (checkout aborts).
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        true
    }

    /// The raw amount this code takes off a running total.
    ///
    /// Not yet clamped; the pricing engine caps it at the running amount so
    /// totals never go negative.
    pub fn amount_off(&self, running: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => running.percentage_of(self.value as u32),
            DiscountKind::FixedAmount => Money::from_cents(self.value),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Payment method recorded on a sale. A label only - no gateway integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    CreditCard,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale transaction.
///
/// Immutable once created - a Sale is never updated or deleted; it is the
/// durable audit record. Created exclusively by the checkout engine as the
/// terminal step of a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    /// The authenticated cashier; identity is validated upstream.
    pub user_id: i64,
    pub customer_id: Option<i64>,
    /// Gross total before discounts.
    pub total_amount: Money,
    /// Total after discounts; what the customer actually paid.
    pub final_amount: Money,
    pub payment_method: PaymentMethod,
    pub transaction_time: DateTime<Utc>,
    /// Line items; loaded separately from the sale row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a committed sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub sale_id: i64,
    /// Weak reference: the product may later be deleted without
    /// invalidating this row.
    pub product_id: i64,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
}

impl SaleItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Applied Discount
// =============================================================================

/// Audit record of one discount code applied to a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AppliedDiscount {
    pub sale_id: i64,
    pub discount_id: i64,
    /// Code at time of sale (frozen).
    pub code_snapshot: String,
    /// What this code actually took off the running total.
    pub amount_discounted: Money,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer optionally attached to a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A cashier or admin account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 hash. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sales Report
// =============================================================================

/// Aggregated sales for one product within a report range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSales {
    pub product_id: i64,
    /// From the sale-item name snapshot, so deleted products still report.
    pub product_name: String,
    /// Total units sold in range.
    pub total_sold: i64,
    /// Σ quantity × unit price over the range.
    pub total_value: Money,
}

/// Derived, non-persisted revenue view over a date range.
///
/// Computed on demand from committed sales; has no lifecycle of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    /// Inclusive lower bound; open (all history) when absent.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound; open when absent.
    pub end_date: Option<NaiveDate>,
    /// Σ final_amount of included sales.
    pub total_revenue: Money,
    /// Count of included sales.
    pub total_transactions: i64,
    /// Ranked by total_sold descending, ties broken by product_id ascending.
    pub top_selling_products: Vec<ProductSales>,
}

// =============================================================================
// Unit Tests
// =============================================================================
