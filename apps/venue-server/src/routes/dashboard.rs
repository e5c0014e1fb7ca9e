//! # Dashboard Routes

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::warn;
use venue_core::dashboard::{dashboard_action, DashboardAction, DashboardData, Period};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/data", get(data))
        .route("/dashboard/action/{action_type}", post(action))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// `today`, `week` or `month`; anything else means `today`.
    pub period: Option<String>,
    /// Viewer's IANA zone; defaults to the venue's.
    pub tz: Option<String>,
}

async fn data(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardData>> {
    let period = Period::from_param(query.period.as_deref());
    let tz = state.viewer_timezone(query.tz.as_deref())?;
    Ok(Json(state.db.dashboard().get_dashboard_data(period, tz).await?))
}

/// Unknown actions answer 200 with `{"error": ...}`.
async fn action(Path(action_type): Path<String>) -> Json<DashboardAction> {
    let resolved = dashboard_action(&action_type);
    if let DashboardAction::Unknown { .. } = resolved {
        warn!(action_type = %action_type, "Unknown dashboard action");
    }
    Json(resolved)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, seed, test_app};
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, TimeZone, Timelike, Utc};
    use chrono_tz::Tz;
    use serde_json::json;
    use venue_core::{NewSession, SessionType};

    #[tokio::test]
    async fn test_dashboard_shape() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        call(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({
                "customer": "Ivy",
                "session_type": "public",
                "individual_type": "table",
                "resource_id": seeded.table_id,
            })),
        )
        .await;

        let (status, data) =
            call(&app, Method::GET, "/dashboard/data?period=today&tz=Africa/Cairo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["stats"]["total_sessions"], 1);
        assert_eq!(data["stats"]["active_sessions"], 1);
        assert_eq!(data["resources"]["tables"][0]["status"], "occupied");
        assert_eq!(data["activities"].as_array().unwrap().len(), 1);
        assert_eq!(data["chart_data"]["labels"].as_array().unwrap().len(), 24);
    }

    #[tokio::test]
    async fn test_today_revenue_in_currency_units() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        // A fixed-offset zone where it is 18:xx now, so 14:00 has passed.
        let now = Utc::now();
        let mut offset = (18 - now.hour() as i32).rem_euclid(24);
        if offset > 14 {
            offset -= 24;
        }
        let zone = match offset {
            0 => "Etc/GMT".to_string(),
            o if o > 0 => format!("Etc/GMT-{}", o),
            o => format!("Etc/GMT+{}", -o),
        };
        let tz: Tz = zone.parse().unwrap();
        let today = now.with_timezone(&tz).date_naive();
        let start = tz
            .from_local_datetime(&today.and_hms_opt(14, 0, 0).unwrap())
            .single()
            .unwrap()
            .with_timezone(&Utc);

        // 150 minutes at 20.00/h
        let detail = state
            .db
            .sessions()
            .create_session_at(
                &NewSession {
                    customer: "Kim".to_string(),
                    session_type: SessionType::Private,
                    individual_type: None,
                    resource_id: seeded.room_id,
                },
                start,
            )
            .await
            .unwrap();
        state
            .db
            .sessions()
            .finish_at(&detail.session.id, start + Duration::minutes(150))
            .await
            .unwrap();

        let uri = format!("/dashboard/data?period=today&tz={}", zone.replace('+', "%2B"));
        let (status, data) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let buckets = data["chart_data"]["datasets"][0]["data"].as_array().unwrap();
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[14].as_f64(), Some(50.0));
        assert_eq!(buckets.iter().filter(|v| v.as_f64() != Some(0.0)).count(), 1);
        assert_eq!(data["stats"]["revenue"].as_f64(), Some(50.0));
    }

    #[tokio::test]
    async fn test_unknown_period_means_today() {
        let (app, _) = test_app().await;
        let (status, data) = call(&app, Method::GET, "/dashboard/data?period=decade", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["chart_data"]["labels"].as_array().unwrap().len(), 24);
        assert_eq!(data["chart_data"]["datasets"][0]["label"], "Revenue");
    }

    #[tokio::test]
    async fn test_bad_timezone() {
        let (app, _) = test_app().await;
        let (status, err) = call(&app, Method::GET, "/dashboard/data?tz=Mars/Base", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_actions() {
        let (app, _) = test_app().await;

        let (status, action) =
            call(&app, Method::POST, "/dashboard/action/new_session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(action["model"], "session");
        assert_eq!(action["target"], "new");

        let (status, unknown) = call(&app, Method::POST, "/dashboard/action/launch", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unknown["error"], "Unknown action");
    }
}
