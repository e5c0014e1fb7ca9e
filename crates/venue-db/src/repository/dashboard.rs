//! # Dashboard Repository
//!
//! Gathers the dashboard snapshot in one read connection.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period + now + viewer tz ─► DashboardWindow                           │
//! │                                                                         │
//! │  stats       sessions started / orders created in window, running now  │
//! │  resources   live board per category (independent of the window)       │
//! │  activities  last 2 hours: ≤10 sessions + ≤5 orders, newest first      │
//! │  chart_data  finished session revenue by local hour or day             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use tracing::debug;
use venue_core::dashboard::{
    activity_cutoff, recent_activities, resource_rows, revenue_chart, DashboardData,
    DashboardResources, DashboardStats, DashboardWindow, Period,
};
use venue_core::{ResourceCategory, MAX_ACTIVITIES, MAX_CAFE_ACTIVITIES};

use super::cafe_order::created_between;
use super::catalog::{active_holders, list_resources, type_names};
use super::session::started_between;
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    pub async fn get_dashboard_data(&self, period: Period, tz: Tz) -> DbResult<DashboardData> {
        self.get_dashboard_data_at(period, Utc::now(), tz).await
    }

    /// Dashboard snapshot as of `now` for a viewer in `tz`.
    pub async fn get_dashboard_data_at(
        &self,
        period: Period,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> DbResult<DashboardData> {
        let window = DashboardWindow::for_period(period, now, tz);
        let mut conn = self.pool.acquire().await?;

        // Reservations may start after `now`; the window ends at `now`.
        let sessions: Vec<_> = started_between(&mut conn, Some(window.start), None, None)
            .await?
            .into_iter()
            .filter(|s| window.contains(s.session.starting_time))
            .collect();
        let orders: Vec<_> = created_between(&mut conn, Some(window.start), None, None)
            .await?
            .into_iter()
            .filter(|o| window.contains(o.order.created_at))
            .collect();
        let active_sessions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE state = 'running'")
                .fetch_one(&mut *conn)
                .await?;

        let stats = DashboardStats::collect(&sessions, active_sessions, &orders);

        let names = type_names(&mut conn).await?;
        let mut resources = DashboardResources::default();
        for category in ResourceCategory::ALL {
            let instances = list_resources(&mut conn, Some(category)).await?;
            let holders = active_holders(&mut conn, category).await?;
            *resources.slot_mut(category) = resource_rows(&instances, &holders, &names);
        }

        let cutoff = activity_cutoff(now);
        let until = Some(now + Duration::seconds(1));
        let recent_sessions =
            started_between(&mut conn, Some(cutoff), until, Some(MAX_ACTIVITIES as i64)).await?;
        let recent_orders =
            created_between(&mut conn, Some(cutoff), until, Some(MAX_CAFE_ACTIVITIES as i64)).await?;
        let activities = recent_activities(&recent_sessions, &recent_orders);

        let chart_data = revenue_chart(&window, &sessions);

        debug!(
            period = ?period,
            sessions = stats.total_sessions,
            orders = stats.cafe_orders,
            activities = activities.len(),
            "Dashboard data collected"
        );

        Ok(DashboardData {
            stats,
            resources,
            activities,
            chart_data,
        })
    }
}
