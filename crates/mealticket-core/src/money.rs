//! # Money Module
//!
//! Provides the `Money` type used for coupon face values and transaction
//! totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Coupon value 45.00 × 3 coupons                                         │
//! │                                                                         │
//! │  As floats:   45.0 * 3.0 works, but 0.1 + 0.2 = 0.30000000000000004   │
//! │  As cents:    4500 * 3 = 13500 (always exact)                          │
//! │                                                                         │
//! │  Totals are stored as integer cents; only clients format them.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mealticket_core::money::Money;
//!
//! let coupon = Money::from_cents(4500);
//! let total = coupon.multiply_quantity(2);
//! assert_eq!(total.cents(), 9000);
//! assert_eq!(total.as_major_units(), 90.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// RedemptionConfig.coupon_value_cents ──► CouponTransaction.unit_value_cents
///                                               │
///                                               ▼ × coupons_used
///                                    CouponTransaction.total_amount_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use mealticket_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(45, 0).cents(), 4500);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the fractional portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as a float of major units.
    ///
    /// For display and JSON compatibility with clients that expect
    /// `total_amount: 90.0`. Never feed the result back into arithmetic.
    #[inline]
    pub fn as_major_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a unit value by a coupon count.
    ///
    /// ## Example
    /// ```rust
    /// use mealticket_core::money::Money;
    ///
    /// let total = Money::from_cents(4500).multiply_quantity(3);
    /// assert_eq!(total.cents(), 13500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `major.minor` rendering; currency symbols are a client concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

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
