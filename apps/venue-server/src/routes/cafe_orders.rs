//! # Café Order Routes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use venue_core::{CafeOrderDetail, LineItem, NewCafeOrder, NewLineItem};

use super::StateFilter;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cafe-orders", get(list).post(create))
        .route("/cafe-orders/{id}", get(get_detail).delete(remove))
        .route("/cafe-orders/{id}/start", post(start))
        .route("/cafe-orders/{id}/finish", post(finish))
        .route("/cafe-orders/{id}/lines", post(add_line))
        .route("/cafe-orders/{id}/lines/{line_id}", delete(remove_line))
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<StateFilter>,
) -> ApiResult<Json<Vec<CafeOrderDetail>>> {
    Ok(Json(state.db.cafe_orders().list(filter.state).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewCafeOrder>,
) -> ApiResult<(StatusCode, Json<CafeOrderDetail>)> {
    let detail = state.db.cafe_orders().create_order(&input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CafeOrderDetail>> {
    Ok(Json(state.db.cafe_orders().get_detail(&id).await?))
}

async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CafeOrderDetail>> {
    Ok(Json(state.db.cafe_orders().mark_running(&id).await?))
}

async fn finish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CafeOrderDetail>> {
    Ok(Json(state.db.cafe_orders().finish(&id).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.cafe_orders().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NewLineItem>,
) -> ApiResult<(StatusCode, Json<LineItem>)> {
    let line = state.db.cafe_orders().add_line(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

async fn remove_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.db.cafe_orders().remove_line(&id, &line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, seed, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_order_totals_and_lifecycle() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        let (status, order) = call(
            &app,
            Method::POST,
            "/cafe-orders",
            Some(json!({ "customer": "Eve", "table_id": seeded.cafe_table_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["reference"], "CAFE/00001");
        assert_eq!(order["state"], "available");
        assert_eq!(order["table_label"], "Table 1");
        let id = order["id"].as_str().unwrap().to_string();

        // 2 × 10.00 at 0% and 1 × 5.00 at 20% = 24.00
        for line in [
            json!({ "product_id": seeded.snack_id, "quantity": 2, "unit_price_cents": 1000 }),
            json!({ "product_id": seeded.snack_id, "quantity": 1, "discount_bps": 2000 }),
        ] {
            let (status, _) =
                call(&app, Method::POST, &format!("/cafe-orders/{}/lines", id), Some(line)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, detail) = call(&app, Method::GET, &format!("/cafe-orders/{}", id), None).await;
        assert_eq!(detail["total_cents"], 2400);
        assert_eq!(detail["lines"].as_array().unwrap().len(), 2);

        // A second tab on the same table is refused
        let (status, _) = call(
            &app,
            Method::POST,
            "/cafe-orders",
            Some(json!({ "customer": "Frank", "table_id": seeded.cafe_table_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) =
            call(&app, Method::POST, &format!("/cafe-orders/{}/finish", id), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, running) =
            call(&app, Method::POST, &format!("/cafe-orders/{}/start", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(running["state"], "running");

        let (status, finished) =
            call(&app, Method::POST, &format!("/cafe-orders/{}/finish", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finished["state"], "finished");

        let (status, _) = call(&app, Method::DELETE, &format!("/cafe-orders/{}", id), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_remove_line_and_delete_open_order() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        let (_, order) = call(
            &app,
            Method::POST,
            "/cafe-orders",
            Some(json!({ "customer": "Gina", "table_id": seeded.cafe_table_id })),
        )
        .await;
        let id = order["id"].as_str().unwrap().to_string();

        let (_, line) = call(
            &app,
            Method::POST,
            &format!("/cafe-orders/{}/lines", id),
            Some(json!({ "product_id": seeded.snack_id, "quantity": 1 })),
        )
        .await;
        let line_id = line["id"].as_str().unwrap();

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/cafe-orders/{}/lines/{}", id, line_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, Method::DELETE, &format!("/cafe-orders/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = call(&app, Method::GET, "/cafe-orders", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}
