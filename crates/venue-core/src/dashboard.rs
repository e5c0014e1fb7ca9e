//! # Dashboard Derivations
//!
//! Builds the management dashboard from snapshots read by venue-db:
//! window bounds, headline stats, the live resource board, the recent
//! activity feed and the revenue chart.
//!
//! ## Payload
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DashboardData                                                          │
//! │  ├── stats       total_sessions, active_sessions, cafe_orders, revenue  │
//! │  ├── resources   rooms / consoles / tables / cafe_tables                │
//! │  │               [{id, name, status, type}]   (live, not windowed)      │
//! │  ├── activities  ≤ 10 newest events of the last 2 hours                 │
//! │  └── chart_data  today: 24 hourly buckets                               │
//! │                  week/month: one bucket per local day                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All bucketing happens in the viewer's time zone.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::availability::{occupancy, Occupancy};
use crate::detail::{CafeOrderDetail, SessionDetail};
use crate::money::Money;
use crate::time::{day_start, local_date};
use crate::types::{RecordState, Resource, ResourceCategory};
use crate::{ACTIVITY_WINDOW_HOURS, MAX_ACTIVITIES, MAX_CAFE_ACTIVITIES};

// =============================================================================
// Period & Window
// =============================================================================

/// Dashboard period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Today,
    Week,
    Month,
}

impl Period {
    /// Parses a period, treating anything unknown as `today`.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("week") => Period::Week,
            Some("month") => Period::Month,
            _ => Period::Today,
        }
    }
}

/// The `[start, end]` interval a period covers, in UTC.
#[derive(Debug, Clone, Copy)]
pub struct DashboardWindow {
    pub period: Period,
    pub tz: Tz,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DashboardWindow {
    /// Local midnight of today / Monday / the first of the month, up to `now`.
    pub fn for_period(period: Period, now: DateTime<Utc>, tz: Tz) -> Self {
        let today = local_date(now, tz);
        let first_day = match period {
            Period::Today => today,
            Period::Week => today - Duration::days(today.weekday().num_days_from_monday() as i64),
            Period::Month => today.with_day(1).unwrap_or(today),
        };

        DashboardWindow {
            period,
            tz,
            start: day_start(first_day, tz),
            end: now,
        }
    }

    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Every local calendar day in the window, oldest first.
    pub fn days(&self) -> Vec<NaiveDate> {
        let first = local_date(self.start, self.tz);
        let last = local_date(self.end, self.tz);
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}

// =============================================================================
// Stats
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    /// Sessions started in the window.
    pub total_sessions: i64,
    /// Sessions running right now.
    pub active_sessions: i64,
    /// Café orders created in the window.
    pub cafe_orders: i64,
    /// Totals of finished sessions and orders in the window, in major
    /// currency units.
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub revenue: Money,
}

impl DashboardStats {
    /// `sessions` started in the window, `orders` created in it.
    pub fn collect(
        sessions: &[SessionDetail],
        active_sessions: i64,
        orders: &[CafeOrderDetail],
    ) -> Self {
        let session_revenue: Money = sessions
            .iter()
            .filter(|s| s.session.state == RecordState::Finished)
            .map(SessionDetail::total)
            .sum();
        let order_revenue: Money = orders
            .iter()
            .filter(|o| o.order.state == RecordState::Finished)
            .map(CafeOrderDetail::total)
            .sum();

        DashboardStats {
            total_sessions: sessions.len() as i64,
            active_sessions,
            cafe_orders: orders.len() as i64,
            revenue: session_revenue + order_revenue,
        }
    }
}

// =============================================================================
// Resource Board
// =============================================================================

/// One instance on the resource board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResourceStatusRow {
    pub id: String,
    pub name: String,
    pub status: Occupancy,
    /// Type name, `N/A` when the instance has none.
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardResources {
    pub rooms: Vec<ResourceStatusRow>,
    pub consoles: Vec<ResourceStatusRow>,
    pub tables: Vec<ResourceStatusRow>,
    pub cafe_tables: Vec<ResourceStatusRow>,
}

impl DashboardResources {
    pub fn slot_mut(&mut self, category: ResourceCategory) -> &mut Vec<ResourceStatusRow> {
        match category {
            ResourceCategory::PrivateRoom => &mut self.rooms,
            ResourceCategory::PublicConsole => &mut self.consoles,
            ResourceCategory::PublicTable => &mut self.tables,
            ResourceCategory::CafeTable => &mut self.cafe_tables,
        }
    }
}

/// Board rows for instances of one category.
///
/// `type_names` maps type id → type name.
pub fn resource_rows(
    instances: &[Resource],
    holders: &HashSet<String>,
    type_names: &HashMap<String, String>,
) -> Vec<ResourceStatusRow> {
    instances
        .iter()
        .map(|r| ResourceStatusRow {
            id: r.id.clone(),
            name: r.label.clone(),
            status: occupancy(r, holders),
            type_name: r
                .type_id
                .as_ref()
                .and_then(|id| type_names.get(id))
                .cloned()
                .unwrap_or_else(|| "N/A".to_string()),
        })
        .collect()
}

// =============================================================================
// Activity Feed
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    SessionStart,
    SessionEnd,
    CafeOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    #[ts(as = "String")]
    pub time: DateTime<Utc>,
    pub icon: String,
    pub color: String,
}

/// Lower bound of the activity feed.
pub fn activity_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(ACTIVITY_WINDOW_HOURS)
}

/// Merges recent sessions and café orders into the feed, newest first.
pub fn recent_activities(sessions: &[SessionDetail], orders: &[CafeOrderDetail]) -> Vec<Activity> {
    let session_events = sessions.iter().take(MAX_ACTIVITIES).map(|s| {
        if s.session.state == RecordState::Finished {
            Activity {
                kind: ActivityKind::SessionEnd,
                title: format!("Session Ended - {}", s.location),
                time: s.session.ending_time.unwrap_or(s.session.starting_time),
                icon: "fa-stop".to_string(),
                color: "danger".to_string(),
            }
        } else {
            Activity {
                kind: ActivityKind::SessionStart,
                title: format!("Session Started - {}", s.location),
                time: s.session.starting_time,
                icon: "fa-play".to_string(),
                color: "success".to_string(),
            }
        }
    });

    let order_events = orders.iter().take(MAX_CAFE_ACTIVITIES).map(|o| Activity {
        kind: ActivityKind::CafeOrder,
        title: format!("Cafe Order - {}", o.table_label),
        time: o.order.created_at,
        icon: "fa-coffee".to_string(),
        color: "warning".to_string(),
    });

    let mut activities: Vec<Activity> = session_events.chain(order_events).collect();
    activities.sort_by(|a, b| b.time.cmp(&a.time));
    activities.truncate(MAX_ACTIVITIES);
    activities
}

// =============================================================================
// Revenue Chart
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    /// One amount per label, in major currency units.
    #[serde(with = "crate::money::major_units_vec")]
    #[ts(type = "Array<number>")]
    pub data: Vec<Money>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
    pub fill: bool,
}

impl ChartDataset {
    fn revenue(label: &str, data: Vec<Money>) -> Self {
        ChartDataset {
            label: label.to_string(),
            data,
            background_color: "rgba(102, 126, 234, 0.1)".to_string(),
            border_color: "rgba(102, 126, 234, 1)".to_string(),
            border_width: 2,
            fill: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Revenue of finished sessions bucketed by local start hour or day.
///
/// Sessions outside the window or not finished are ignored.
pub fn revenue_chart(window: &DashboardWindow, sessions: &[SessionDetail]) -> ChartData {
    let finished = sessions.iter().filter(|s| {
        s.session.state == RecordState::Finished && window.contains(s.session.starting_time)
    });

    match window.period {
        Period::Today => {
            let mut buckets = vec![Money::zero(); 24];
            for s in finished {
                let hour = s.session.starting_time.with_timezone(&window.tz).hour() as usize;
                buckets[hour] += s.total();
            }
            ChartData {
                labels: (0..24).map(|h| format!("{:02}:00", h)).collect(),
                datasets: vec![ChartDataset::revenue("Revenue", buckets)],
            }
        }
        Period::Week | Period::Month => {
            let days = window.days();
            let mut by_day: HashMap<NaiveDate, Money> = HashMap::new();
            for s in finished {
                *by_day
                    .entry(local_date(s.session.starting_time, window.tz))
                    .or_default() += s.total();
            }

            let label_format = if window.period == Period::Week {
                "%a"
            } else {
                "%b %d"
            };
            ChartData {
                labels: days.iter().map(|d| d.format(label_format).to_string()).collect(),
                datasets: vec![ChartDataset::revenue(
                    "Daily Revenue",
                    days.iter()
                        .map(|d| by_day.get(d).copied().unwrap_or_default())
                        .collect(),
                )],
            }
        }
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub resources: DashboardResources,
    pub activities: Vec<Activity>,
    pub chart_data: ChartData,
}

// =============================================================================
// Actions
// =============================================================================

/// What the client should open for a dashboard shortcut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActionDescriptor {
    pub name: String,
    /// Record kind the view shows.
    pub model: String,
    /// Views in preference order.
    pub view_modes: Vec<String>,
    /// `new` opens a fresh form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Result of a dashboard action: a descriptor or an error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DashboardAction {
    Open(ActionDescriptor),
    Unknown { error: String },
}

fn descriptor(name: &str, model: &str, view_modes: &[&str], target: Option<&str>) -> ActionDescriptor {
    ActionDescriptor {
        name: name.to_string(),
        model: model.to_string(),
        view_modes: view_modes.iter().map(|v| v.to_string()).collect(),
        target: target.map(str::to_string),
    }
}

/// Resolves a dashboard shortcut. Unknown actions are a payload, not a failure.
pub fn dashboard_action(action_type: &str) -> DashboardAction {
    match action_type {
        "new_session" => DashboardAction::Open(descriptor(
            "New Session",
            "session",
            &["form"],
            Some("new"),
        )),
        "new_order" => DashboardAction::Open(descriptor(
            "New Cafe Order",
            "cafe_order",
            &["form"],
            Some("new"),
        )),
        "view_reports" => DashboardAction::Open(descriptor(
            "Session Reports",
            "session_report",
            &["pivot", "graph", "list"],
            None,
        )),
        "manage_resources" => DashboardAction::Open(descriptor(
            "Resource Management",
            "room",
            &["list", "form"],
            None,
        )),
        _ => DashboardAction::Unknown {
            error: "Unknown action".to_string(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
