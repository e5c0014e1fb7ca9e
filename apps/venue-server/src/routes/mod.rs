//! # HTTP Routes
//!
//! One module per area, each contributing a `Router<AppState>`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /health                          liveness + database check            │
//! │  /dashboard/...                   snapshot, shortcut actions           │
//! │  /catalog/..., /availability/...  types, instances, products           │
//! │  /sessions/...                    session lifecycle and lines          │
//! │  /cafe-orders/...                 café order lifecycle and lines       │
//! │  /billing/...                     billing form, confirm, invoices      │
//! │  /reports/...                     session and café report rows         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod billing;
pub mod cafe_orders;
pub mod catalog;
pub mod dashboard;
pub mod reports;
pub mod sessions;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use venue_core::RecordState;

use crate::state::AppState;

/// Builds the complete API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(dashboard::router())
        .merge(catalog::router())
        .merge(sessions::router())
        .merge(cafe_orders::router())
        .merge(billing::router())
        .merge(reports::router())
        .with_state(state)
}

/// `?state=` filter shared by the session and café order lists.
#[derive(Debug, Default, Deserialize)]
pub struct StateFilter {
    pub state: Option<RecordState>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub venue: String,
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        venue: state.config.venue.name.clone(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use venue_core::{
        NewProduct, NewResource, NewResourceType, ResourceCategory, ResourceTypeKind,
    };
    use venue_db::{Database, DbConfig};

    use crate::config::VenueConfig;
    use crate::state::AppState;

    /// Instances created by [`seed`].
    pub struct Seeded {
        pub room_id: String,
        pub console_id: String,
        pub table_id: String,
        pub cafe_table_id: String,
        pub snack_id: String,
    }

    pub async fn test_app() -> (Router, AppState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = VenueConfig::default();
        config.venue.name = "Test Venue".to_string();
        config.venue.currency = "EGP".to_string();
        let state = AppState::new(db, config).unwrap();
        (super::router(state.clone()), state)
    }

    /// Deluxe room at 20.00/h, PS5 at 15.00/h, pool table at 10.00/h,
    /// one café table and a 5.00 snack.
    pub async fn seed(db: &Database) -> Seeded {
        let catalog = db.catalog();
        let mut ids = Vec::new();
        for (kind, name, price, category, label) in [
            (ResourceTypeKind::Room, "Deluxe", 2000, ResourceCategory::PrivateRoom, "VIP"),
            (ResourceTypeKind::Console, "PS5", 1500, ResourceCategory::PublicConsole, "1"),
            (ResourceTypeKind::Table, "Pool", 1000, ResourceCategory::PublicTable, "1"),
        ] {
            let t = catalog
                .create_type(&NewResourceType {
                    kind,
                    name: name.to_string(),
                    price_per_hour_cents: price,
                })
                .await
                .unwrap();
            let r = catalog
                .create_resource(&NewResource {
                    category,
                    label: label.to_string(),
                    sequence: 1,
                    type_id: Some(t.id),
                })
                .await
                .unwrap();
            ids.push(r.id);
        }
        let cafe_table = catalog
            .create_resource(&NewResource {
                category: ResourceCategory::CafeTable,
                label: "1".to_string(),
                sequence: 1,
                type_id: None,
            })
            .await
            .unwrap();
        let snack = db
            .products()
            .create(&NewProduct {
                sku: "SNACK-01".to_string(),
                name: "Chips".to_string(),
                list_price_cents: 500,
            })
            .await
            .unwrap();

        Seeded {
            room_id: ids[0].clone(),
            console_id: ids[1].clone(),
            table_id: ids[2].clone(),
            cafe_table_id: cafe_table.id,
            snack_id: snack.id,
        }
    }

    /// Sends one request through the router and decodes the JSON body.
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}
