//! # Money Module
//!
//! Provides the `Money` type for every monetary value in the venue:
//! hourly rates, line prices, session totals, invoice amounts, payments.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    90 min at 20.00/h in floats: 1.5 * 20.0 = 30.000000000000004         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    5400 s * 2000 cents / 3600 s = 3000 cents, exactly                   │
//! │    Rounding happens once, at a named step, half away from zero          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use venue_core::money::Money;
//! use venue_core::types::DiscountRate;
//!
//! let unit = Money::from_cents(500);
//! let before = unit.multiply_quantity(1);
//! let after = before.apply_discount(DiscountRate::from_percent(20));
//! assert_eq!(after.cents(), 400);
//!
//! let hourly = Money::from_cents(2000);
//! assert_eq!(hourly.for_duration_secs(90 * 60).cents(), 3000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::DiscountRate;

/// Seconds in one hour; hourly rates are prorated against this.
const SECONDS_PER_HOUR: i128 = 3600;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// ResourceType.price_per_hour ──► time price ──┐
///                                              ├──► Session total ──► Invoice
/// LineItem (qty × unit − discount) ────────────┘                        │
///                                                                        ▼
///                                                           Payment.amount
/// ```
///
/// Arithmetic saturates instead of overflowing. Inputs are bounded by
/// `validation::validate_price_cents` long before that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use venue_core::money::Money;
    ///
    /// let rate = Money::from_cents(2000); // 20.00 per hour
    /// assert_eq!(rate.cents(), 2000);
    /// ```
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

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
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

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use venue_core::money::Money;
    ///
    /// let soda = Money::from_cents(1000);
    /// assert_eq!(soda.multiply_quantity(2).cents(), 2000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns the discount portion of this amount.
    ///
    /// `(amount × bps + 5000) / 10000` in i128, i.e. rounded half away
    /// from zero for positive amounts.
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        let amount = self.0 as i128 * rate.bps() as i128;
        Money::from_cents(saturate(round_div(amount, BPS_SCALE)))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use venue_core::money::Money;
    /// use venue_core::types::DiscountRate;
    ///
    /// let before = Money::from_cents(10000);
    /// let after = before.apply_discount(DiscountRate::from_bps(1000)); // 10% off
    /// assert_eq!(after.cents(), 9000);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        *self - self.discount_amount(rate)
    }

    /// Treats `self` as an hourly rate and prices `seconds` of use.
    ///
    /// ## User Workflow
    /// ```text
    /// Room type "VIP": 20.00 / hour
    /// Session: 14:00 → 15:30 (5400 s)
    ///      │
    ///      ▼
    /// for_duration_secs(5400) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Time price: 30.00
    /// ```
    pub fn for_duration_secs(&self, seconds: i64) -> Money {
        if seconds <= 0 {
            return Money::zero();
        }
        let amount = self.0 as i128 * seconds as i128;
        Money::from_cents(saturate(round_div(amount, SECONDS_PER_HOUR)))
    }

    /// Value in major units, for charts and ratios only.
    #[inline]
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Inverse of [`Money::as_major_f64`], rounded to the nearest cent.
    #[inline]
    pub fn from_major_f64(value: f64) -> Self {
        // `as` saturates for out-of-range floats and maps NaN to 0.
        Money((value * 100.0).round() as i64)
    }
}

/// Clamps an i128 intermediate into the i64 range.
fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Major-Unit Serialization
// =============================================================================

/// Serializes `Money` as a decimal amount (`50.0`, not `5000`).
///
/// For view models read by people or charting code; stored records and
/// request bodies stay in `*_cents` integers.
///
/// ```rust
/// use serde::Serialize;
/// use venue_core::money::{self, Money};
///
/// #[derive(Serialize)]
/// struct Row {
///     #[serde(with = "money::major_units")]
///     total: Money,
/// }
///
/// let json = serde_json::to_string(&Row { total: Money::from_cents(5000) }).unwrap();
/// assert_eq!(json, r#"{"total":50.0}"#);
/// ```
pub mod major_units {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.as_major_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        f64::deserialize(deserializer).map(Money::from_major_f64)
    }
}

/// [`major_units`] for sequences, e.g. chart series.
pub mod major_units_vec {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Money], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(Money::as_major_f64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Money>, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        Ok(values.into_iter().map(Money::from_major_f64).collect())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering, e.g. `30.00`. Currency symbols are a
/// presentation concern.
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
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
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(3000).to_string(), "30.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_discount_rounding() {
        // 20% of 5.00
        let before = Money::from_cents(500);
        assert_eq!(before.discount_amount(DiscountRate::from_percent(20)).cents(), 100);
        assert_eq!(before.apply_discount(DiscountRate::from_percent(20)).cents(), 400);

        // 12.5% of 0.99 = 12.375 cents → 12
        let odd = Money::from_cents(99);
        assert_eq!(odd.discount_amount(DiscountRate::from_bps(1250)).cents(), 12);

        // 100% leaves nothing, 0% leaves everything
        assert!(before.apply_discount(DiscountRate::from_percent(100)).is_zero());
        assert_eq!(before.apply_discount(DiscountRate::zero()), before);
    }

    #[test]
    fn test_discount_is_monotonic() {
        let before = Money::from_cents(1337);
        let mut previous = before;
        for bps in (0..=10_000).step_by(25) {
            let after = before.apply_discount(DiscountRate::from_bps(bps));
            assert!(after <= previous, "bps {} increased the amount", bps);
            previous = after;
        }
    }

    #[test]
    fn test_hourly_proration() {
        let rate = Money::from_cents(2000);
        assert_eq!(rate.for_duration_secs(5400).cents(), 3000);
        assert_eq!(rate.for_duration_secs(3600).cents(), 2000);
        // 1 second of 20.00/h is 0.0056 → 1 cent
        assert_eq!(rate.for_duration_secs(1).cents(), 1);
        assert!(rate.for_duration_secs(0).is_zero());
        assert!(rate.for_duration_secs(-60).is_zero());
        assert!(Money::zero().for_duration_secs(5400).is_zero());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX / 2 + 1);
        assert_eq!(huge.multiply_quantity(2).cents(), i64::MAX);
        assert_eq!((huge + huge).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - huge).cents(), i64::MIN);
        assert_eq!(vec![huge, huge, huge].into_iter().sum::<Money>().cents(), i64::MAX);
        assert_eq!(Money::from_cents(i64::MAX).for_duration_secs(7200).cents(), i64::MAX);
        assert!(Money::from_cents(i64::MAX)
            .apply_discount(DiscountRate::from_percent(100))
            .is_zero());
    }

    #[test]
    fn test_major_units() {
        assert_eq!(Money::from_major_f64(50.0).cents(), 5000);
        assert_eq!(Money::from_major_f64(0.125).cents(), 13);
        assert_eq!(Money::from_major_f64(f64::NAN).cents(), 0);
        assert_eq!(Money::from_cents(5000).as_major_f64(), 50.0);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
        assert!((total.as_major_f64() - 20.0).abs() < f64::EPSILON);
    }
}
