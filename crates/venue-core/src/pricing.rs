//! # Pricing & Line-Item Calculator
//!
//! Line amounts, time-based session pricing and aggregate totals.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LINE                                                                   │
//! │    before = quantity × unit_price                                       │
//! │    after  = before − round(before × discount_bps / 10000)              │
//! │                                                                         │
//! │  TIME (sessions only)                                                   │
//! │    spent  = ending_time − starting_time   (0 if either is missing)      │
//! │    price  = round(spent_seconds × hourly_rate / 3600)                   │
//! │    hourly_rate = price of the type matching the session category        │
//! │                                                                         │
//! │  TOTAL                                                                  │
//! │    session    = Σ after + time price                                    │
//! │    café order = Σ after                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{DiscountRate, LineItem, Session};

// =============================================================================
// Line Items
// =============================================================================

impl LineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn discount(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn amount_before_discount(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// `before × (1 − discount/100)`.
    #[inline]
    pub fn amount_after_discount(&self) -> Money {
        self.amount_before_discount().apply_discount(self.discount())
    }
}

/// Sum of discounted line amounts.
pub fn lines_total(lines: &[LineItem]) -> Money {
    lines.iter().map(LineItem::amount_after_discount).sum()
}

/// Sum of undiscounted line amounts.
pub fn lines_total_before_discount(lines: &[LineItem]) -> Money {
    lines.iter().map(LineItem::amount_before_discount).sum()
}

// =============================================================================
// Time Pricing
// =============================================================================

/// Seconds between start and end, 0 when the end is missing or not after
/// the start.
pub fn spent_seconds(starting: DateTime<Utc>, ending: Option<DateTime<Utc>>) -> i64 {
    match ending {
        Some(end) => (end - starting).num_seconds().max(0),
        None => 0,
    }
}

/// Prices a session's time at `hourly_rate`.
///
/// Returns zero when the session has no ending time, when no rate applies
/// or the rate is zero.
pub fn time_price(
    starting: DateTime<Utc>,
    ending: Option<DateTime<Utc>>,
    hourly_rate: Option<Money>,
) -> Money {
    match hourly_rate {
        Some(rate) if rate.is_positive() => rate.for_duration_secs(spent_seconds(starting, ending)),
        _ => Money::zero(),
    }
}

impl Session {
    pub fn spent_seconds(&self) -> i64 {
        spent_seconds(self.starting_time, self.ending_time)
    }

    /// Spent time in minutes (fractional).
    pub fn spent_minutes(&self) -> f64 {
        self.spent_seconds() as f64 / 60.0
    }

    pub fn spent_hours(&self) -> f64 {
        self.spent_seconds() as f64 / 3600.0
    }

    pub fn time_price(&self, hourly_rate: Option<Money>) -> Money {
        time_price(self.starting_time, self.ending_time, hourly_rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::TargetKind;
    use chrono::{Duration, TimeZone};

    pub(crate) fn line(quantity: i64, unit_price_cents: i64, discount_bps: u32) -> LineItem {
        LineItem {
            id: uuid::Uuid::new_v4().to_string(),
            owner_kind: TargetKind::CafeOrder,
            owner_id: "order-1".to_string(),
            product_id: "product-1".to_string(),
            name_snapshot: "Soda".to_string(),
            quantity,
            unit_price_cents,
            discount_bps,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_amounts() {
        let l = line(2, 1000, 0);
        assert_eq!(l.amount_before_discount().cents(), 2000);
        assert_eq!(l.amount_after_discount().cents(), 2000);

        let l = line(1, 500, 2000);
        assert_eq!(l.amount_before_discount().cents(), 500);
        assert_eq!(l.amount_after_discount().cents(), 400);
    }

    #[test]
    fn test_after_discount_matches_formula() {
        for (qty, price, bps) in [(3, 333, 1500), (7, 1999, 2500), (1, 1, 5000), (12, 250, 0)] {
            let l = line(qty, price, bps);
            let exact = (qty * price) as f64 * (1.0 - bps as f64 / 10_000.0);
            let got = l.amount_after_discount().cents() as f64;
            assert!((got - exact).abs() <= 0.5, "{} vs {}", got, exact);
        }
    }

    #[test]
    fn test_cafe_order_scenario_total() {
        let lines = vec![line(2, 1000, 0), line(1, 500, 2000)];
        assert_eq!(lines_total(&lines).cents(), 2400);
        assert_eq!(lines_total_before_discount(&lines).cents(), 2500);
    }

    #[test]
    fn test_time_price_ninety_minutes() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();
        let price = time_price(t0, Some(t0 + Duration::minutes(90)), Some(Money::from_cents(2000)));
        assert_eq!(price.cents(), 3000);
    }

    #[test]
    fn test_time_price_zero_cases() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();
        let rate = Some(Money::from_cents(2000));

        assert!(time_price(t0, None, rate).is_zero());
        assert!(time_price(t0, Some(t0), rate).is_zero());
        assert!(time_price(t0, Some(t0 + Duration::hours(1)), None).is_zero());
        assert!(time_price(t0, Some(t0 + Duration::hours(1)), Some(Money::zero())).is_zero());
        // Never negative even with an inverted range
        assert!(!time_price(t0, Some(t0 - Duration::hours(1)), rate).is_negative());
    }

    #[test]
    fn test_spent_seconds() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();
        assert_eq!(spent_seconds(t0, Some(t0 + Duration::minutes(45))), 2700);
        assert_eq!(spent_seconds(t0, None), 0);
    }
}
