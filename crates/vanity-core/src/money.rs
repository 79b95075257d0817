//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Minor Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount is stored as whole paise (1/100 of a rupee):              │
//! │                                                                         │
//! │    ₹499.00  →  Money(49900)                                             │
//! │    18% GST on ₹499.00 = 8982 paise (rounded half up)                    │
//! │                                                                         │
//! │  Text input ("499", "499.5", "499.50") is parsed exactly, never         │
//! │  through f64.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vanity_core::money::Money;
//!
//! let price = Money::parse_decimal("499.50").unwrap();
//! assert_eq!(price.cents(), 49950);
//! assert_eq!((price * 2).to_string(), "₹999.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;
use crate::DEFAULT_CURRENCY_SYMBOL;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise).
///
/// Signed so refunds and stock write-downs can be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal amount such as `"499"`, `"499.5"` or `"-12.05"`.
    ///
    /// At most two fractional digits are accepted.
    ///
    /// ```rust
    /// use vanity_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12.5").unwrap().cents(), 1250);
    /// assert!(Money::parse_decimal("12.505").is_err());
    /// assert!(Money::parse_decimal("abc").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        parse_hundredths(input)
            .map(Money)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: format!("'{}' is not a decimal amount with at most 2 decimals", input.trim()),
            })
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates tax at `rate`, rounding half up.
    ///
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so large
    /// invoices cannot overflow.
    ///
    /// ```rust
    /// use vanity_core::money::Money;
    /// use vanity_core::types::TaxRate;
    ///
    /// let tax = Money::from_cents(49900).calculate_tax(TaxRate::from_bps(1800));
    /// assert_eq!(tax.cents(), 8982);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(apply_bps(self.0, rate.bps()))
    }

    /// The portion of this amount given by `bps` (1000 = 10%).
    pub fn percentage(&self, bps: u32) -> Money {
        Money(apply_bps(self.0, bps))
    }

    /// Applies a percentage discount and returns the discounted amount.
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        Money(self.0 - apply_bps(self.0, discount_bps))
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Formats with an explicit currency symbol, e.g. `Rs 10.50`.
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }

    /// Formats without any currency symbol, e.g. `10.50` (CSV exports).
    pub fn to_decimal_string(&self) -> String {
        self.format_with_symbol("")
    }
}

/// `(value * bps + 5000) / 10000` with the half-up rounding applied away from
/// zero for negative values.
fn apply_bps(value: i64, bps: u32) -> i64 {
    let product = value as i128 * bps as i128;
    let rounded = if product < 0 {
        (product - 5000) / 10000
    } else {
        (product + 5000) / 10000
    };
    rounded as i64
}

/// Parses `[-]digits[.d[d]]` into hundredths.
pub(crate) fn parse_hundredths(input: &str) -> Option<i64> {
    let input = input.trim();
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (whole, fraction) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    let value = whole_value.checked_mul(100)?.checked_add(fraction_value)?;
    Some(if negative { -value } else { value })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with the default currency symbol (`₹10.99`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol(DEFAULT_CURRENCY_SYMBOL))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_cents(500).to_string(), "₹5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-₹5.50");
        assert_eq!(Money::from_cents(-550).format_with_symbol("$"), "-$5.50");
        assert_eq!(Money::from_cents(7).to_decimal_string(), "0.07");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("499").unwrap().cents(), 49900);
        assert_eq!(Money::parse_decimal(" 499.5 ").unwrap().cents(), 49950);
        assert_eq!(Money::parse_decimal("0.05").unwrap().cents(), 5);
        assert_eq!(Money::parse_decimal(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal("-12.05").unwrap().cents(), -1205);

        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal(".").is_err());
        assert!(Money::parse_decimal("1.234").is_err());
        assert!(Money::parse_decimal("1,50").is_err());
        assert!(Money::parse_decimal("1e3").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(vec![a, b, b].into_iter().sum::<Money>().cents(), 2000);
    }

    #[test]
    fn test_tax_calculation_rounds_half_up() {
        // 18% of 2.75 = 0.495 → 0.50
        let tax = Money::from_cents(275).calculate_tax(TaxRate::from_bps(1800));
        assert_eq!(tax.cents(), 50);

        let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_cents(10000);
        assert_eq!(subtotal.percentage(1000).cents(), 1000);
        assert_eq!(subtotal.apply_percentage_discount(1000).cents(), 9000);
    }

    #[test]
    fn test_negative_rounding_is_symmetric() {
        assert_eq!(Money::from_cents(-275).percentage(1800).cents(), -50);
    }
}
