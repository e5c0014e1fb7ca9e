//! # Report Routes
//!
//! Flat rows for pivoting. `from` and `to` are inclusive local dates
//! (`YYYY-MM-DD`) in the viewer's zone; either may be left out.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use venue_core::report::{CafeReportRow, DateRange, SessionReportRow};
use venue_core::ValidationError;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/sessions", get(sessions))
        .route("/reports/cafe-orders", get(cafe_orders))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub tz: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> Result<DateRange, ValidationError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ValidationError::InvalidFormat {
                    field: "from".to_string(),
                    reason: format!("{} is after {}", from, to),
                });
            }
        }
        Ok(DateRange {
            from: self.from,
            to: self.to,
        })
    }
}

async fn sessions(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<SessionReportRow>>> {
    let range = query.range()?;
    let tz = state.viewer_timezone(query.tz.as_deref())?;
    Ok(Json(state.db.reports().session_rows(range, tz).await?))
}

async fn cafe_orders(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<CafeReportRow>>> {
    let range = query.range()?;
    let tz = state.viewer_timezone(query.tz.as_deref())?;
    Ok(Json(state.db.reports().cafe_rows(range, tz).await?))
}
