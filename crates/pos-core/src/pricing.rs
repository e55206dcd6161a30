//! # Pricing Engine
//!
//! Pure computation of cart totals and discount application.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pricing Pipeline                                    │
//! │                                                                         │
//! │  lines: [(unit $10.00, qty 3), (unit $2.50, qty 2)]                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total_amount = Σ unit_price × qty = $35.00                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discounts applied SEQUENTIALLY, in the order supplied:                │
//! │                                                                         │
//! │    running = $35.00                                                    │
//! │    "TEN_PCT"  (10%)  → running = $31.50                                │
//! │    "FIVE_OFF" ($5)   → running = $26.50                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  final_amount = $26.50 (clamped at $0.00, never negative)              │
//! │                                                                         │
//! │  ⚠ CODE ORDER IS PART OF THE CALLER CONTRACT                           │
//! │    [10%, $5] on $100 → 90.00 → 85.00                                   │
//! │    [$5, 10%] on $100 → 95.00 → 85.50                                   │
//! │    Each discount applies to the RUNNING amount, so reordering the      │
//! │    codes changes the result. This is deliberate and documented, not    │
//! │    a bug; do not "canonicalize" the order.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No side effects; safe to call repeatedly with the same inputs.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Discount;

/// A cart line with its snapshotted unit price, ready to price.
///
/// The unit price is captured by the caller (optimistic read, no locks);
/// the same snapshot is later persisted into the sale item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLine {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// What one discount code actually took off the running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountApplication {
    pub discount_id: i64,
    pub code: String,
    pub amount: Money,
}

/// The result of pricing a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Per-line totals, same order as the input lines.
    pub line_totals: Vec<Money>,
    /// Gross total before discounts.
    pub total_amount: Money,
    /// Total after discounts; never negative.
    pub final_amount: Money,
    /// Per-code deductions in application order.
    pub applied_discounts: Vec<DiscountApplication>,
}

/// Prices a cart: line totals, gross total, and sequential discounts.
///
/// Discounts apply to the running amount in the order supplied. A
/// percentage code takes `value` bps of the running amount; a fixed code
/// subtracts its cent value. Every deduction is clamped so the running
/// amount never goes below zero, and the recorded per-code amount is the
/// clamped (actual) deduction.
pub fn price_cart(lines: &[PricedLine], discounts: &[Discount]) -> Quote {
    let line_totals: Vec<Money> = lines.iter().map(PricedLine::line_total).collect();
    let total_amount = line_totals
        .iter()
        .fold(Money::zero(), |acc, &t| acc + t);

    let mut running = total_amount;
    let mut applied_discounts = Vec::with_capacity(discounts.len());

    for discount in discounts {
        // Clamp: a code can never take off more than what remains
        let amount = std::cmp::min(discount.amount_off(running), running);
        running = running.sub_clamped(amount);

        applied_discounts.push(DiscountApplication {
            discount_id: discount.id,
            code: discount.code.clone(),
            amount,
        });
    }

    Quote {
        line_totals,
        total_amount,
        final_amount: running,
        applied_discounts,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountKind;
    use chrono::Utc;

    fn priced(product_id: i64, quantity: i64, unit_cents: i64) -> PricedLine {
        PricedLine {
            product_id,
            quantity,
            unit_price: Money::from_cents(unit_cents),
        }
    }

    fn discount(id: i64, code: &str, kind: DiscountKind, value: i64) -> Discount {
        Discount {
            id,
            code: code.to_string(),
            description: None,
            kind,
            value,
            is_active: true,
            valid_from: None,
            valid_until: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_without_discounts() {
        let lines = [priced(1, 3, 1000), priced(2, 2, 250)];
        let quote = price_cart(&lines, &[]);

        assert_eq!(quote.line_totals[0], Money::from_cents(3000));
        assert_eq!(quote.line_totals[1], Money::from_cents(500));
        assert_eq!(quote.total_amount, Money::from_cents(3500));
        assert_eq!(quote.final_amount, Money::from_cents(3500));
        assert!(quote.applied_discounts.is_empty());
    }

    /// Code order changes the outcome; both orders are pinned here.
    /// $100 cart, 10% code, $5 code.
    #[test]
    fn test_discount_order_sensitivity() {
        let lines = [priced(1, 10, 1000)]; // $100.00
        let pct = discount(1, "TEN_PCT", DiscountKind::Percentage, 1000);
        let fixed = discount(2, "FIVE_OFF", DiscountKind::FixedAmount, 500);

        // [10%, $5]: 100 × 0.9 = 90, 90 − 5 = 85
        let quote = price_cart(&lines, &[pct.clone(), fixed.clone()]);
        assert_eq!(quote.final_amount, Money::from_cents(8500));
        assert_eq!(quote.applied_discounts[0].amount, Money::from_cents(1000));
        assert_eq!(quote.applied_discounts[1].amount, Money::from_cents(500));

        // [$5, 10%]: 100 − 5 = 95, 95 × 0.9 = 85.50
        let quote = price_cart(&lines, &[fixed, pct]);
        assert_eq!(quote.final_amount, Money::from_cents(8550));
        assert_eq!(quote.applied_discounts[0].amount, Money::from_cents(500));
        assert_eq!(quote.applied_discounts[1].amount, Money::from_cents(950));
    }

    #[test]
    fn test_final_amount_clamped_at_zero() {
        let lines = [priced(1, 1, 300)]; // $3.00
        let big_fixed = discount(1, "TAKE5", DiscountKind::FixedAmount, 500);

        let quote = price_cart(&lines, &[big_fixed]);
        assert_eq!(quote.final_amount, Money::zero());
        // Recorded deduction is what actually came off, not the face value
        assert_eq!(quote.applied_discounts[0].amount, Money::from_cents(300));
    }

    #[test]
    fn test_discount_after_zero_takes_nothing() {
        let lines = [priced(1, 1, 300)];
        let d1 = discount(1, "TAKE5", DiscountKind::FixedAmount, 500);
        let d2 = discount(2, "TEN_PCT", DiscountKind::Percentage, 1000);

        let quote = price_cart(&lines, &[d1, d2]);
        assert_eq!(quote.final_amount, Money::zero());
        assert_eq!(quote.applied_discounts[1].amount, Money::zero());
    }

    #[test]
    fn test_percentage_applies_to_running_amount() {
        // Two 10% codes: 100 → 90 → 81, NOT 100 → 90 → 80
        let lines = [priced(1, 10, 1000)];
        let a = discount(1, "A", DiscountKind::Percentage, 1000);
        let b = discount(2, "B", DiscountKind::Percentage, 1000);

        let quote = price_cart(&lines, &[a, b]);
        assert_eq!(quote.final_amount, Money::from_cents(8100));
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let lines = [priced(1, 2, 1234), priced(2, 1, 567)];
        let d = discount(1, "D", DiscountKind::Percentage, 750);

        let a = price_cart(&lines, std::slice::from_ref(&d));
        let b = price_cart(&lines, std::slice::from_ref(&d));
        assert_eq!(a, b);
    }
}
