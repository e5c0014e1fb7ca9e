//! # Session Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /sessions              start now          → running              │
//! │  POST /sessions/reserve      future start       → available            │
//! │  POST /sessions/{id}/start   available          → running              │
//! │  POST /sessions/{id}/finish  running            → finished             │
//! │  DELETE /sessions/{id}       available only                            │
//! │  POST/DELETE .../lines       while not finished                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use venue_core::{LineItem, NewLineItem, NewSession, SessionDetail};

use super::StateFilter;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list).post(create))
        .route("/sessions/reserve", post(reserve))
        .route("/sessions/{id}", get(get_detail).delete(remove))
        .route("/sessions/{id}/start", post(start))
        .route("/sessions/{id}/finish", post(finish))
        .route("/sessions/{id}/lines", post(add_line))
        .route("/sessions/{id}/lines/{line_id}", delete(remove_line))
}

/// Body of `POST /sessions/reserve`.
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    #[serde(flatten)]
    pub session: NewSession,
    pub starting_time: DateTime<Utc>,
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<StateFilter>,
) -> ApiResult<Json<Vec<SessionDetail>>> {
    let sessions = state.db.sessions().list(filter.state).await?;
    debug!(count = sessions.len(), state = ?filter.state, "Listed sessions");
    Ok(Json(sessions))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewSession>,
) -> ApiResult<(StatusCode, Json<SessionDetail>)> {
    let detail = state.db.sessions().create_session(&input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn reserve(
    State(state): State<AppState>,
    Json(request): Json<ReserveRequest>,
) -> ApiResult<(StatusCode, Json<SessionDetail>)> {
    let detail = state
        .db
        .sessions()
        .reserve_session(&request.session, request.starting_time)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionDetail>> {
    Ok(Json(state.db.sessions().get_detail(&id).await?))
}

async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionDetail>> {
    Ok(Json(state.db.sessions().mark_running(&id).await?))
}

async fn finish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionDetail>> {
    Ok(Json(state.db.sessions().finish(&id).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.sessions().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NewLineItem>,
) -> ApiResult<(StatusCode, Json<LineItem>)> {
    let line = state.db.sessions().add_line(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

async fn remove_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.db.sessions().remove_line(&id, &line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, seed, test_app};
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        let (status, created) = call(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({
                "customer": "Alice",
                "session_type": "private",
                "resource_id": seeded.room_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["reference"], "ROOM/00001");
        assert_eq!(created["state"], "running");
        assert_eq!(created["location"], "VIP");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, line) = call(
            &app,
            Method::POST,
            &format!("/sessions/{}/lines", id),
            Some(json!({ "product_id": seeded.snack_id, "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(line["name_snapshot"], "Chips");

        let (status, detail) = call(&app, Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["products_total_cents"], 1000);

        // Running sessions cannot be deleted
        let (status, body) = call(&app, Method::DELETE, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_LOGIC");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (status, finished) =
            call(&app, Method::POST, &format!("/sessions/{}/finish", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finished["state"], "finished");
        assert!(finished["ending_time"].is_string());

        let (status, running) = call(&app, Method::GET, "/sessions?state=running", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(running.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_occupied_resource_conflict() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;
        let body = json!({
            "customer": "Bob",
            "session_type": "public",
            "individual_type": "console",
            "resource_id": seeded.console_id,
        });

        let (status, _) = call(&app, Method::POST, "/sessions", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = call(&app, Method::POST, "/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_public_session_requires_individual_type() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        let (status, err) = call(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({
                "customer": "Bob",
                "session_type": "public",
                "resource_id": seeded.table_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reserve_start_and_delete() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;
        let starting = Utc::now() + Duration::hours(2);

        let (status, reserved) = call(
            &app,
            Method::POST,
            "/sessions/reserve",
            Some(json!({
                "customer": "Carol",
                "session_type": "public",
                "individual_type": "table",
                "resource_id": seeded.table_id,
                "starting_time": starting.to_rfc3339(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reserved["state"], "available");
        assert_eq!(reserved["reference"], "TBL/00001");
        let id = reserved["id"].as_str().unwrap().to_string();

        // Reserved sessions cannot finish
        let (status, _) = call(&app, Method::POST, &format!("/sessions/{}/finish", id), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&app, Method::DELETE, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, err) = call(&app, Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reserve_in_the_past_rejected() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/sessions/reserve",
            Some(json!({
                "customer": "Dan",
                "session_type": "private",
                "resource_id": seeded.room_id,
                "starting_time": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
