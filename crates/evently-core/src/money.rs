//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:  $299 × 2.9% + $0.30  = 8.971000000000002                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Basis Points                             │
//! │    29900 cents × 290 bps = (8_671_000 + 5000) / 10000 = 867 cents      │
//! │    867 + 30 = 897 cents → $8.97, every time                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use evently_core::money::{Money, Rate};
//!
//! let price = Money::from_cents(40_000);         // $400.00
//! let twenty_pct = Rate::from_bps(2_000);        // 20%
//!
//! assert_eq!(price.percent_of(twenty_pct).cents(), 8_000);
//! assert_eq!(price.to_string(), "$400.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// Event.price_cents ──► coupon::evaluate ──► discount
///                                │
///                                ▼
///                     amount - discount ──► FeeSchedule::quote ──► total
///                                                                    │
///                                                                    ▼
///                                                       Card / bank charge
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use evently_core::money::Money;
    ///
    /// let price = Money::from_cents(29_900); // $299.00
    /// assert_eq!(price.cents(), 29_900);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole dollars.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Money(dollars * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the dollars portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Takes a rate of this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ```rust
    /// use evently_core::money::{Money, Rate};
    ///
    /// // 2.9% of $10.00 = $0.29
    /// assert_eq!(Money::from_cents(1_000).percent_of(Rate::from_bps(290)).cents(), 29);
    /// // 0.5% of $1.01 = 0.505 cents → 1 cent
    /// assert_eq!(Money::from_cents(101).percent_of(Rate::from_bps(50)).cents(), 1);
    /// ```
    pub fn percent_of(&self, rate: Rate) -> Money {
        // i128 keeps large amounts from overflowing
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Clamps to the optional bounds, lower bound first.
    pub fn clamp_between(self, minimum: Option<Money>, maximum: Option<Money>) -> Money {
        let mut value = self;
        if let Some(floor) = minimum {
            value = value.max(floor);
        }
        if let Some(ceiling) = maximum {
            value = value.min(ceiling);
        }
        value
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as "$10.99" or "-$5.50".
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

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage in basis points.
///
/// 1 basis point = 0.01%, so 2000 bps = 20% and 50 bps = 0.5%.
/// Percentage coupons and fee schedules both use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from whole percent (20 → 20%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_and_dollars() {
        let money = Money::from_cents(1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
        assert_eq!(Money::from_dollars(299).cents(), 29_900);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // $10.00 at 8.25% = 82.5 cents → 83
        assert_eq!(Money::from_cents(1000).percent_of(Rate::from_bps(825)).cents(), 83);
        // $299.00 at 2.9% = 867.1 cents → 867
        assert_eq!(Money::from_cents(29_900).percent_of(Rate::from_bps(290)).cents(), 867);
        assert_eq!(Money::from_cents(12_345).percent_of(Rate::zero()).cents(), 0);
    }

    #[test]
    fn test_clamp_between() {
        let floor = Some(Money::from_cents(150));
        let ceiling = Some(Money::from_cents(1000));

        assert_eq!(Money::from_cents(50).clamp_between(floor, ceiling).cents(), 150);
        assert_eq!(Money::from_cents(500).clamp_between(floor, ceiling).cents(), 500);
        assert_eq!(Money::from_cents(5000).clamp_between(floor, ceiling).cents(), 1000);
        assert_eq!(Money::from_cents(5000).clamp_between(None, None).cents(), 5000);
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_percent(20).to_string(), "20%");
        assert_eq!(Rate::from_bps(290).to_string(), "2.90%");
        assert_eq!(Rate::from_bps(50).to_string(), "0.50%");
        assert!((Rate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }
}
