//! # Reporting Rows
//!
//! Flattens sessions and café orders into one read-only row per record,
//! partitioned by local date, month, year and quarter for pivoting.
//!
//! ```text
//!   SessionDetail ──► SessionReportRow   (time + products financials)
//!   CafeOrderDetail ──► CafeReportRow    (line statistics)
//!         │
//!         └── DatePartition::of(start or created_at, viewer tz)
//! ```
//!
//! Amounts serialize in major currency units (`30.0`), ready for pivot
//! tables; the record details keep their `*_cents` integers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::detail::{CafeOrderDetail, SessionDetail};
use crate::money::Money;
use crate::pricing::lines_total_before_discount;
use crate::time::local_date;
use crate::types::{
    IndividualType, PaymentState, RecordState, ResourceCategory, SessionType,
};

/// Hours in a day, the basis of resource utilization.
const HOURS_PER_DAY: f64 = 24.0;

// =============================================================================
// Date Partition
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DatePartition {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// `YYYY-MM`
    pub month: String,
    pub year: i32,
    /// `Q1`..`Q4`
    pub quarter: String,
}

impl DatePartition {
    pub fn of(instant: DateTime<Utc>, tz: Tz) -> Self {
        let date = local_date(instant, tz);
        DatePartition {
            date,
            month: date.format("%Y-%m").to_string(),
            year: date.year(),
            quarter: format!("Q{}", (date.month() - 1) / 3 + 1),
        }
    }
}

/// Optional inclusive date range on the partition date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

// =============================================================================
// Session Rows
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionReportRow {
    #[serde(flatten)]
    pub partition: DatePartition,
    pub session_id: String,
    pub reference: String,
    pub customer: String,
    pub session_type: SessionType,
    pub individual_type: Option<IndividualType>,
    pub category: ResourceCategory,
    pub resource_id: String,
    pub resource_label: String,
    pub resource_type: Option<String>,
    pub state: RecordState,
    pub payment_status: PaymentState,
    #[ts(as = "String")]
    pub starting_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub ending_time: Option<DateTime<Utc>>,
    pub spent_minutes: f64,
    pub spent_hours: f64,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub time_price: Money,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub products_total: Money,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub total: Money,
    pub session_count: i64,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub revenue_per_hour: Money,
    /// Share of a 24-hour day, capped at 100.
    pub resource_utilization: f64,
}

impl SessionReportRow {
    pub fn from_detail(detail: &SessionDetail, tz: Tz) -> Self {
        let session = &detail.session;
        let hours = session.spent_hours();
        let total = detail.total();

        let revenue_per_hour = if hours > 0.0 {
            Money::from_cents((total.cents() as f64 / hours).round() as i64)
        } else {
            Money::zero()
        };

        SessionReportRow {
            partition: DatePartition::of(session.starting_time, tz),
            session_id: session.id.clone(),
            reference: session.reference.clone(),
            customer: session.customer.clone(),
            session_type: session.session_type,
            individual_type: session.individual_type,
            category: session.category,
            resource_id: session.resource_id.clone(),
            resource_label: detail.resource_label.clone(),
            resource_type: detail.type_name.clone(),
            state: session.state,
            payment_status: detail.payment_status.unwrap_or(PaymentState::NotPaid),
            starting_time: session.starting_time,
            ending_time: session.ending_time,
            spent_minutes: detail.spent_minutes,
            spent_hours: hours,
            time_price: detail.time_price(),
            products_total: detail.products_total(),
            total,
            session_count: 1,
            revenue_per_hour,
            resource_utilization: (hours / HOURS_PER_DAY * 100.0).min(100.0),
        }
    }
}

// =============================================================================
// Café Rows
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CafeReportRow {
    #[serde(flatten)]
    pub partition: DatePartition,
    pub order_id: String,
    pub reference: String,
    pub customer: String,
    pub table_id: String,
    pub table_label: String,
    pub state: RecordState,
    pub payment_status: PaymentState,
    /// Number of lines.
    pub product_count: i64,
    pub total_quantity: i64,
    /// Quantity-weighted mean unit price.
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub avg_unit_price: Money,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub total_discount: Money,
    /// Mean line discount in percent.
    pub discount_percentage: f64,
    pub order_count: i64,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub total: Money,
    pub items_per_order: i64,
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub revenue_per_table: Money,
}

impl CafeReportRow {
    pub fn from_detail(detail: &CafeOrderDetail, tz: Tz) -> Self {
        let order = &detail.order;
        let lines = &detail.lines;

        let total_quantity: i64 = lines.iter().map(|l| l.quantity).sum();
        let before = lines_total_before_discount(lines);
        let total = detail.total();

        let avg_unit_price = if total_quantity > 0 {
            Money::from_cents((before.cents() as f64 / total_quantity as f64).round() as i64)
        } else {
            Money::zero()
        };

        let discount_percentage = if lines.is_empty() {
            0.0
        } else {
            lines.iter().map(|l| l.discount().percentage()).sum::<f64>() / lines.len() as f64
        };

        CafeReportRow {
            partition: DatePartition::of(order.created_at, tz),
            order_id: order.id.clone(),
            reference: order.reference.clone(),
            customer: order.customer.clone(),
            table_id: order.table_id.clone(),
            table_label: detail.table_label.clone(),
            state: order.state,
            payment_status: detail.payment_status.unwrap_or(PaymentState::NotPaid),
            product_count: lines.len() as i64,
            total_quantity,
            avg_unit_price,
            total_discount: before - total,
            discount_percentage,
            order_count: 1,
            total,
            items_per_order: total_quantity,
            revenue_per_table: total,
        }
    }
}
