//! # Record Details
//!
//! Sessions and café orders as read by callers: the stored row, its lines,
//! and every derived amount computed once at construction.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::lines_total;
use crate::types::{CafeOrder, LineItem, PaymentState, Session};

/// What a session's resource contributes to pricing and display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceInfo {
    pub label: String,
    pub type_name: Option<String>,
    pub hourly_rate: Option<Money>,
}

/// A session with lines, time price and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub lines: Vec<LineItem>,
    /// Location name (room label, `Console 3`, `Table 5`).
    pub location: String,
    pub resource_label: String,
    pub type_name: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub spent_minutes: f64,
    pub time_price_cents: i64,
    pub products_total_cents: i64,
    pub total_cents: i64,
    /// `None` until the session is invoiced.
    pub payment_status: Option<PaymentState>,
}

impl SessionDetail {
    pub fn new(
        session: Session,
        lines: Vec<LineItem>,
        resource: ResourceInfo,
        payment_status: Option<PaymentState>,
    ) -> Self {
        let time_price = session.time_price(resource.hourly_rate);
        let products_total = lines_total(&lines);

        SessionDetail {
            location: session.category.location_name(&resource.label),
            spent_minutes: session.spent_minutes(),
            time_price_cents: time_price.cents(),
            products_total_cents: products_total.cents(),
            total_cents: (time_price + products_total).cents(),
            hourly_rate_cents: resource.hourly_rate.map(|m| m.cents()),
            resource_label: resource.label,
            type_name: resource.type_name,
            session,
            lines,
            payment_status,
        }
    }

    #[inline]
    pub fn time_price(&self) -> Money {
        Money::from_cents(self.time_price_cents)
    }

    #[inline]
    pub fn products_total(&self) -> Money {
        Money::from_cents(self.products_total_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A café order with lines and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CafeOrderDetail {
    #[serde(flatten)]
    pub order: CafeOrder,
    pub lines: Vec<LineItem>,
    pub table_label: String,
    pub total_cents: i64,
    pub payment_status: Option<PaymentState>,
}

impl CafeOrderDetail {
    pub fn new(
        order: CafeOrder,
        lines: Vec<LineItem>,
        table_label: String,
        payment_status: Option<PaymentState>,
    ) -> Self {
        let total = lines_total(&lines);
        CafeOrderDetail {
            order,
            lines,
            table_label,
            total_cents: total.cents(),
            payment_status,
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}
