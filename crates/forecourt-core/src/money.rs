//! # Money and Volume
//!
//! Fixed-point quantities used by every row and every total.
//!
//! ## Why Integer Hundredths?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A dashboard that sums meter readings in floats drifts:                 │
//! │    45.1 × 102.3 = 4613.7299999999995                                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer hundredths, prices in millionths                 │
//! │    Volume 45.10 L      → 4510                                           │
//! │    Price  102.30 / L   → 102300000                                      │
//! │    Value  = 4510 × 102300000 / 10^6 → 461373 (4613.73)                  │
//! │                                                                         │
//! │  Only the product is rounded, so a 102.555 price stays 102.555.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forecourt_core::money::{Money, UnitPrice, Volume};
//!
//! let sold = Volume::from_hundredths(4500);        // 45.00 L
//! let price = UnitPrice::from_f64(10.0);           // 10.00 per litre
//! assert_eq!(Money::value_of(sold, price), Money::from_hundredths(45000));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Shared helpers
// =============================================================================

/// Millionths in one currency unit.
const PRICE_SCALE: i64 = 1_000_000;

/// Converts a float to hundredths, rounding half away from zero.
///
/// Non-finite input becomes zero: the backend occasionally sends `null`-ish
/// numbers and the form treats those as empty.
fn f64_to_hundredths(value: f64) -> i64 {
    f64_to_scaled(value, 100)
}

fn f64_to_scaled(value: f64, scale: i64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value * scale as f64).round() as i64
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

fn write_hundredths(f: &mut fmt::Formatter<'_>, value: i64) -> fmt::Result {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    f.pad(&format!("{}{}.{:02}", sign, abs / 100, abs % 100))
}

// =============================================================================
// Money
// =============================================================================

/// A monetary amount in hundredths of the currency unit (paise for INR).
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► ProductRow.price ──► ProductRow.sales_value ──┐
///                                                                  ├─► short collections
/// cash + phone pay + credit card ──► CollectionTotals.total ──────┘
/// ```
///
/// Signed because short collections are routinely negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from hundredths of the currency unit.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Money(hundredths)
    }

    /// Creates an amount from major and minor units.
    ///
    /// ```rust
    /// use forecourt_core::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 50).hundredths(), 1050);
    /// assert_eq!(Money::from_major_minor(-10, 0).hundredths(), -1000);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a backend JSON number, rounding to two decimals.
    pub fn from_f64(value: f64) -> Self {
        Money(f64_to_hundredths(value))
    }

    /// Returns the raw hundredths.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a JSON-friendly float.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Value of `volume` sold at `unit_price`, rounded to two decimals.
    ///
    /// ## Implementation
    /// hundredths(L) × millionths(price) is in hundred-millionths, so one
    /// division by 10^6 (half away from zero) brings it back.
    ///
    /// ```rust
    /// use forecourt_core::money::{Money, UnitPrice, Volume};
    ///
    /// let value = Money::value_of(Volume::from_hundredths(4510), UnitPrice::from_f64(102.3));
    /// assert_eq!(value.hundredths(), 461373);
    ///
    /// let value = Money::value_of(Volume::from_litres(100), UnitPrice::from_f64(102.555));
    /// assert_eq!(value.hundredths(), 1025550);
    /// ```
    pub fn value_of(volume: Volume, unit_price: UnitPrice) -> Money {
        let raw = volume.hundredths() as i128 * unit_price.millionths() as i128;
        Money(div_round(raw, PRICE_SCALE as i128) as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hundredths(f, self.0)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Price
// =============================================================================

/// A per-litre price in millionths of the currency unit.
///
/// Backend prices may carry more than two decimals. Keeping them at this
/// precision means a row's value is rounded once, after multiplying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitPrice(i64);

impl UnitPrice {
    #[inline]
    pub const fn from_millionths(millionths: i64) -> Self {
        UnitPrice(millionths)
    }

    /// Converts a backend JSON number, keeping six decimals.
    pub fn from_f64(value: f64) -> Self {
        UnitPrice(f64_to_scaled(value, PRICE_SCALE))
    }

    #[inline]
    pub const fn millionths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }
}

impl Default for UnitPrice {
    fn default() -> Self {
        UnitPrice(0)
    }
}

/// At least two decimals, more only when the price carries them: `10.00`, `102.555`.
impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = PRICE_SCALE as u64;
        let mut fraction = format!("{:06}", abs % scale);
        while fraction.len() > 2 && fraction.ends_with('0') {
            fraction.pop();
        }
        f.pad(&format!("{}{}.{}", sign, abs / scale, fraction))
    }
}

// =============================================================================
// Volume
// =============================================================================

/// A fuel volume in hundredths of a litre.
///
/// Meter readings (opening, closing), testing, tank level and capacity all use
/// this type. Intermediate results may be negative (`closing - opening` when
/// the meter was misread); the row calculator clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Volume(i64);

impl Volume {
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Volume(hundredths)
    }

    /// Whole litres, for tests and fixtures.
    #[inline]
    pub const fn from_litres(litres: i64) -> Self {
        Volume(litres * 100)
    }

    /// Converts a backend JSON number, rounding to two decimals.
    pub fn from_f64(value: f64) -> Self {
        Volume(f64_to_hundredths(value))
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Volume(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Clamps negative volumes to zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        Volume(self.0.max(0))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hundredths(f, self.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume::zero()
    }
}

impl Add for Volume {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Volume(self.0 + other.0)
    }
}

impl Sub for Volume {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Volume(self.0 - other.0)
    }
}

impl Sum for Volume {
    fn sum<I: Iterator<Item = Volume>>(iter: I) -> Self {
        iter.fold(Volume::zero(), |acc, v| acc + v)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
