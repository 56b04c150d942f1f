//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A supplier balance drifting by a cent per payment is a real loss       │
//! │  and an unexplainable audit gap at the end of the month.                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    $250.00        → Money(25000)      (cents)                           │
//! │    150,000 som    → Money(15000000)   (hundredths)                      │
//! │    Division rounds explicitly; nothing drifts silently.                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use savdo_core::money::Money;
//!
//! // Create from minor units (preferred)
//! let price = Money::from_minor(25000); // $250.00
//!
//! // Arithmetic operations
//! let total = price + Money::from_minor(1500); // $265.00
//!
//! // NEVER from floats - no such constructor exists.
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest unit of its currency
/// (cents for USD, hundredths for som).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for outflows and reversals
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Currency-agnostic**: The currency tag lives on the record that
///   carries the amount; mixing currencies is guarded at the service layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

/// Minor units in one whole thousand (2-decimal currencies).
const THOUSAND_MINOR: i64 = 1_000 * 100;

impl Money {
    /// Creates a Money value from minor units (cents / hundredths).
    ///
    /// ## Example
    /// ```rust
    /// use savdo_core::money::Money;
    ///
    /// let price = Money::from_minor(25000); // $250.00
    /// assert_eq!(price.minor(), 25000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units (dollars / som).
    ///
    /// ## Example
    /// ```rust
    /// use savdo_core::money::Money;
    ///
    /// let price = Money::from_major(250); // $250.00
    /// assert_eq!(price.minor(), 25000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole (major) unit portion.
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the fractional (minor) portion, always 0-99.
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the smaller of two values.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use savdo_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(1500_00);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 4500_00);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Divides by a positive integer, rounding half up to the minor unit.
    ///
    /// ## Where This Is Used
    /// The accessory moving average: total purchase value over total
    /// quantity, quantized to the minor unit the way ledger entries are.
    ///
    /// ## Example
    /// ```rust
    /// use savdo_core::money::Money;
    ///
    /// // 100.01 split 2 ways: 50.005 → 50.01 (half rounds up)
    /// let total = Money::from_minor(10001);
    /// assert_eq!(total.div_round_half_up(2).minor(), 5001);
    /// ```
    pub fn div_round_half_up(&self, divisor: i64) -> Money {
        debug_assert!(divisor > 0, "divisor must be positive");
        // i128 keeps the doubled numerator from overflowing on large sums
        let n = self.0 as i128;
        let d = divisor as i128;
        let q = if n >= 0 {
            (n * 2 + d) / (2 * d)
        } else {
            -(((-n) * 2 + d) / (2 * d))
        };
        Money(q as i64)
    }

    /// Truncates to the nearest lower whole thousand.
    ///
    /// Used when quoting local-currency prices: 101,300 som → 101,000 som
    /// and 99,800 som → 99,000 som. This intentionally floors rather than
    /// rounds; the shop never quotes above the computed price.
    ///
    /// ## Example
    /// ```rust
    /// use savdo_core::money::Money;
    ///
    /// let price = Money::from_major(101_300);
    /// assert_eq!(price.round_to_thousands(), Money::from_major(101_000));
    /// ```
    pub fn round_to_thousands(&self) -> Money {
        Money(self.0.div_euclid(THOUSAND_MINOR) * THOUSAND_MINOR)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and log output; it carries no currency symbol
/// because the currency tag lives on the owning record.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major_part().abs(), self.minor_part())
    }
}

/// Default money is zero.
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Sums an iterator of Money values.
impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
