//! # Cart Value Object
//!
//! The request-scoped cart submitted for checkout.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Cart Normalization                                    │
//! │                                                                         │
//! │  Client sends: items: [{product_id: 3, quantity: 2},                   │
//! │                        {product_id: 1, quantity: 1},                   │
//! │                        {product_id: 3, quantity: 1}]                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Cart::new() ──► reject empty cart / bad quantities                    │
//! │       │          merge duplicate product lines (3 → qty 3)             │
//! │       │          sort ascending by product_id                          │
//! │       ▼                                                                 │
//! │  lines: [(1, qty 1), (3, qty 3)]                                       │
//! │                                                                         │
//! │  Ascending product-id order is the stock-deduction order; a fixed      │
//! │  order across all concurrent checkouts prevents deadlock between       │
//! │  multi-line carts touching the same products.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is a plain value passed into the checkout engine - there is no
//! shared mutable cart state anywhere in the engine.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// A validated, normalized cart.
///
/// ## Invariants (enforced by [`Cart::new`])
/// - At least one line
/// - Every quantity in 1..=[`crate::MAX_LINE_QUANTITY`], also after merging
/// - At most [`MAX_CART_LINES`] distinct products
/// - Lines unique by product_id, sorted ascending
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Validates and normalizes raw request lines into a cart.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] when no lines are supplied
    /// - [`CoreError::Validation`] on a non-positive or oversized quantity
    /// - [`CoreError::CartTooLarge`] past the distinct-line cap
    pub fn new(raw_lines: Vec<CartLine>) -> CoreResult<Self> {
        if raw_lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let mut lines: Vec<CartLine> = Vec::with_capacity(raw_lines.len());
        for raw in raw_lines {
            validate_quantity(raw.quantity)?;

            // Merge duplicate product lines; pricing and deduction are both
            // additive, so (p, 2) + (p, 1) ≡ (p, 3)
            match lines.iter_mut().find(|l| l.product_id == raw.product_id) {
                Some(existing) => existing.quantity += raw.quantity,
                None => lines.push(raw),
            }
        }

        // Re-check merged quantities against the per-line cap
        for line in &lines {
            validate_quantity(line.quantity)?;
        }

        if lines.len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        lines.sort_by_key(|l| l.product_id);

        Ok(Cart { lines })
    }

    /// The normalized lines, ascending by product_id.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, quantity: i64) -> CartLine {
        CartLine {
            product_id,
            quantity,
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = Cart::new(vec![]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_zero_and_negative_quantity_rejected() {
        assert!(Cart::new(vec![line(1, 0)]).is_err());
        assert!(Cart::new(vec![line(1, -2)]).is_err());
    }

    #[test]
    fn test_duplicate_lines_merged() {
        let cart = Cart::new(vec![line(3, 2), line(1, 1), line(3, 1)]).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[1], line(3, 3));
        assert_eq!(cart.total_quantity(), 4);
    }

    #[test]
    fn test_lines_sorted_by_product_id() {
        let cart = Cart::new(vec![line(9, 1), line(2, 1), line(5, 1)]).unwrap();
        let ids: Vec<i64> = cart.lines().iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_merged_quantity_still_capped() {
        // 600 + 600 = 1200 > MAX_LINE_QUANTITY after merging
        let err = Cart::new(vec![line(1, 600), line(1, 600)]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_too_many_distinct_lines_rejected() {
        let lines: Vec<CartLine> = (0..=MAX_CART_LINES as i64).map(|i| line(i, 1)).collect();
        let err = Cart::new(lines).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }
}
