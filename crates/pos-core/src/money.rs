//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    $10.00 / 3 = $3.33 (×3 = $9.99)  → Lost $0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All arithmetic is i64 cents. The one place floats appear is the     │
//! │    JSON boundary, where the wire contract renders money as decimal     │
//! │    numbers (10.5 = $10.50); input is rounded to the nearest cent.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pos_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                     // $21.98
//! let total = price + Money::from_cents(500);  // $15.99
//! ```

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows intermediate negative values in discount math
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Custom serde**: The wire contract renders money as decimal JSON
///   numbers, so serialization converts cents ⇄ major units at the boundary
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► SaleItem.unit_price (snapshot) ──► line total
///                                                          │
///       discounts applied in request order ◄──────────────┘
///                   │
///                   ▼
///       Sale.total_amount / Sale.final_amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use pos_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use pos_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // $8.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes a percentage of this amount, given in basis points.
    ///
    /// 1 basis point = 0.01%, so 1000 bps = 10%.
    /// Integer math with half-up rounding: `(cents × bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use pos_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10_000); // $100.00
    /// assert_eq!(subtotal.percentage_of(1_000).cents(), 1_000); // 10% = $10.00
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        // Use i128 to prevent overflow on large amounts
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Applies a percentage discount and returns the remaining amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use pos_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // $100.00
    /// let discounted = subtotal.apply_percentage_discount(1000); // 10% off
    /// assert_eq!(discounted.cents(), 9000); // $90.00
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage_of(discount_bps)
    }

    /// Subtracts `other`, clamping the result at zero.
    ///
    /// Discount application must never drive a total negative; a $5 code
    /// against a $3 cart takes the cart to $0.00, not -$2.00.
    ///
    /// ## Example
    /// ```rust
    /// use pos_core::money::Money;
    ///
    /// let total = Money::from_cents(300);
    /// let after = total.sub_clamped(Money::from_cents(500));
    /// assert_eq!(after, Money::zero());
    /// ```
    #[inline]
    pub fn sub_clamped(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

// =============================================================================
// Serde: decimal JSON numbers at the boundary
// =============================================================================

/// Serializes as a JSON number of major units: 1099 cents → 10.99.
///
/// Two-decimal cent values are exactly representable in f64 for any
/// realistic amount, so no precision is lost on output.
impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

/// Deserializes from a JSON number, rounding to the nearest cent.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(de::Error::custom("monetary value must be a finite number"));
        }
        let cents = (value * 100.0).round();
        // Guard the i64 range before casting (cast of an out-of-range f64
        // saturates, silently corrupting the amount)
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return Err(de::Error::custom("monetary value out of range"));
        }
        Ok(Money(cents as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and error messages; the API layer serializes the
/// numeric value.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_percentage_of_with_rounding() {
        // $10.00 at 8.25% = $0.825 → $0.83 (half-up)
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage_of(825).cents(), 83);

        // $100.00 at 10% = $10.00 exactly
        let amount = Money::from_cents(10_000);
        assert_eq!(amount.percentage_of(1_000).cents(), 1_000);
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_cents(10000); // $100.00
        let discounted = subtotal.apply_percentage_discount(1000); // 10%
        assert_eq!(discounted.cents(), 9000); // $90.00
    }

    #[test]
    fn test_sub_clamped_floors_at_zero() {
        let total = Money::from_cents(300);
        assert_eq!(total.sub_clamped(Money::from_cents(500)), Money::zero());
        assert_eq!(
            total.sub_clamped(Money::from_cents(100)),
            Money::from_cents(200)
        );
    }

    #[test]
    fn test_serialize_as_decimal_number() {
        let price = Money::from_cents(1050);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "10.5");

        let whole = Money::from_cents(3000);
        let json = serde_json::to_string(&whole).unwrap();
        assert_eq!(json, "30.0");
    }

    #[test]
    fn test_deserialize_rounds_to_cents() {
        let m: Money = serde_json::from_str("10.99").unwrap();
        assert_eq!(m.cents(), 1099);

        // Integers are valid JSON numbers too
        let m: Money = serde_json::from_str("5").unwrap();
        assert_eq!(m.cents(), 500);

        // Sub-cent input rounds to the nearest cent
        let m: Money = serde_json::from_str("0.015").unwrap();
        assert_eq!(m.cents(), 2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = Money::from_cents(123_456);
        let json = serde_json::to_string(&original).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
