//! # Report Repository
//!
//! One row per session or café order, date-partitioned in the viewer's
//! time zone for pivoting.
//!
//! The date range filters on the local partition date. It is first turned
//! into a UTC window for the query, then checked again per row.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use tracing::debug;
use venue_core::report::{CafeReportRow, DateRange, SessionReportRow};
use venue_core::time::{day_end, day_start};

use super::cafe_order::created_between;
use super::session::started_between;
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Session rows whose local start date falls in `range`.
    pub async fn session_rows(&self, range: DateRange, tz: Tz) -> DbResult<Vec<SessionReportRow>> {
        let (start, end) = utc_window(range, tz);
        let mut conn = self.pool.acquire().await?;
        let sessions = started_between(&mut conn, start, end, None).await?;

        let rows: Vec<SessionReportRow> = sessions
            .iter()
            .map(|detail| SessionReportRow::from_detail(detail, tz))
            .filter(|row| range.contains(row.partition.date))
            .collect();

        debug!(count = rows.len(), "Session report rows");
        Ok(rows)
    }

    /// Café rows whose local creation date falls in `range`.
    pub async fn cafe_rows(&self, range: DateRange, tz: Tz) -> DbResult<Vec<CafeReportRow>> {
        let (start, end) = utc_window(range, tz);
        let mut conn = self.pool.acquire().await?;
        let orders = created_between(&mut conn, start, end, None).await?;

        let rows: Vec<CafeReportRow> = orders
            .iter()
            .map(|detail| CafeReportRow::from_detail(detail, tz))
            .filter(|row| range.contains(row.partition.date))
            .collect();

        debug!(count = rows.len(), "Cafe report rows");
        Ok(rows)
    }
}

fn utc_window(range: DateRange, tz: Tz) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (
        range.from.map(|date| day_start(date, tz)),
        range.to.map(|date| day_end(date, tz)),
    )
}
