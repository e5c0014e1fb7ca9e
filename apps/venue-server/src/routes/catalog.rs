//! # Catalog Routes
//!
//! Resource types with their hourly prices, resource instances, café
//! products and the availability lists the booking forms offer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use venue_core::{
    NewProduct, NewResource, NewResourceType, Product, Resource, ResourceCategory, ResourceType,
    ResourceTypeKind,
};

use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_PRODUCT_LIMIT: u32 = 50;
const MAX_PRODUCT_LIMIT: u32 = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog/types", get(list_types).post(create_type))
        .route("/catalog/types/{id}", patch(update_type_price).delete(delete_type))
        .route("/catalog/resources", get(list_resources).post(create_resource))
        .route("/catalog/products", get(list_products).post(create_product))
        .route("/catalog/products/{id}", delete(deactivate_product))
        .route("/availability/{category}", get(availability))
}

#[derive(Debug, Default, Deserialize)]
pub struct TypeFilter {
    pub kind: Option<ResourceTypeKind>,
}

#[derive(Debug, Deserialize)]
pub struct PriceUpdate {
    pub price_per_hour_cents: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub category: Option<ResourceCategory>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

async fn list_types(
    State(state): State<AppState>,
    Query(filter): Query<TypeFilter>,
) -> ApiResult<Json<Vec<ResourceType>>> {
    Ok(Json(state.db.catalog().list_types(filter.kind).await?))
}

async fn create_type(
    State(state): State<AppState>,
    Json(input): Json<NewResourceType>,
) -> ApiResult<(StatusCode, Json<ResourceType>)> {
    let created = state.db.catalog().create_type(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_type_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<PriceUpdate>,
) -> ApiResult<Json<ResourceType>> {
    let updated = state
        .db
        .catalog()
        .update_type_price(&id, update.price_per_hour_cents)
        .await?;
    Ok(Json(updated))
}

async fn delete_type(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.catalog().delete_type(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_resources(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> ApiResult<Json<Vec<Resource>>> {
    Ok(Json(state.db.catalog().list_resources(filter.category).await?))
}

async fn create_resource(
    State(state): State<AppState>,
    Json(input): Json<NewResource>,
) -> ApiResult<(StatusCode, Json<Resource>)> {
    let created = state.db.catalog().create_resource(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Active products, optionally filtered by `q` on name or SKU.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PRODUCT_LIMIT)
        .clamp(1, MAX_PRODUCT_LIMIT);
    let products = state.db.products();

    let found = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => products.search(q, limit).await?,
        None => products.list_active(limit).await?,
    };
    Ok(Json(found))
}

async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let created = state.db.products().create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn deactivate_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Instances of `category` not held by an available or running record.
async fn availability(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Resource>>> {
    let category: ResourceCategory = category.parse()?;
    Ok(Json(state.db.catalog().available(category).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, seed, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_types_and_resources() {
        let (app, _) = test_app().await;

        let (status, room_type) = call(
            &app,
            Method::POST,
            "/catalog/types",
            Some(json!({ "kind": "room", "name": "Standard", "price_per_hour_cents": 1500 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let type_id = room_type["id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            Method::POST,
            "/catalog/types",
            Some(json!({ "kind": "room", "name": "Standard", "price_per_hour_cents": 1500 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, updated) = call(
            &app,
            Method::PATCH,
            &format!("/catalog/types/{}", type_id),
            Some(json!({ "price_per_hour_cents": 1800 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["price_per_hour_cents"], 1800);

        let (status, _) = call(
            &app,
            Method::POST,
            "/catalog/resources",
            Some(json!({
                "category": "private_room",
                "label": "Room 1",
                "sequence": 1,
                "type_id": type_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Still referenced by Room 1
        let (status, _) =
            call(&app, Method::DELETE, &format!("/catalog/types/{}", type_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, rooms) =
            call(&app, Method::GET, "/catalog/resources?category=private_room", None).await;
        assert_eq!(rooms.as_array().unwrap().len(), 1);

        let (_, types) = call(&app, Method::GET, "/catalog/types?kind=console", None).await;
        assert!(types.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_availability_excludes_held_instances() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;

        let (status, free) = call(&app, Method::GET, "/availability/public_console", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(free.as_array().unwrap().len(), 1);

        call(
            &app,
            Method::POST,
            "/sessions",
            Some(json!({
                "customer": "Hank",
                "session_type": "public",
                "individual_type": "console",
                "resource_id": seeded.console_id,
            })),
        )
        .await;

        let (_, free) = call(&app, Method::GET, "/availability/public_console", None).await;
        assert!(free.as_array().unwrap().is_empty());

        let (status, err) = call(&app, Method::GET, "/availability/spaceship", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_products_hide_time_product() {
        let (app, state) = test_app().await;
        seed(&state.db).await;

        let (_, all) = call(&app, Method::GET, "/catalog/products", None).await;
        let skus: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["sku"].as_str().unwrap())
            .collect();
        assert_eq!(skus, vec!["SNACK-01"]);

        let (_, found) = call(&app, Method::GET, "/catalog/products?q=chip", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, none) = call(&app, Method::GET, "/catalog/products?q=TIME", None).await;
        assert!(none.as_array().unwrap().is_empty());
    }
}
