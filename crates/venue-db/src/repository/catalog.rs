//! # Catalog Repository
//!
//! Resource types (priced kinds of room, console, table) and resource
//! instances, plus the availability queries built on them.
//!
//! ## Availability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  active_holders(category)                                              │
//! │    private_room / public_console / public_table                        │
//! │        → sessions.resource_id   WHERE state IN (available, running)    │
//! │    cafe_table                                                          │
//! │        → cafe_orders.table_id   WHERE state IN (available, running)    │
//! │                                                                         │
//! │  available(category) = resources(category) − active_holders(category)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;
use venue_core::availability::available_set;
use venue_core::validation::{validate_new_resource, validate_new_resource_type};
use venue_core::{
    CoreError, Money, NewResource, NewResourceType, Resource, ResourceCategory, ResourceInfo,
    ResourceType, ResourceTypeKind, ValidationError,
};

use crate::error::{DbError, DbResult};

const TYPE_COLUMNS: &str = "id, kind, name, price_per_hour_cents, created_at, updated_at";
const RESOURCE_COLUMNS: &str = "id, category, label, sequence, type_id, created_at";

/// Repository for resource types and instances.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Resource Types
    // =========================================================================

    /// Lists types, optionally of one kind, by name.
    pub async fn list_types(&self, kind: Option<ResourceTypeKind>) -> DbResult<Vec<ResourceType>> {
        let sql = format!(
            "SELECT {} FROM resource_types WHERE (?1 IS NULL OR kind = ?1) ORDER BY kind, name",
            TYPE_COLUMNS
        );
        let types = sqlx::query_as::<_, ResourceType>(&sql)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        Ok(types)
    }

    pub async fn get_type(&self, id: &str) -> DbResult<ResourceType> {
        let mut conn = self.pool.acquire().await?;
        fetch_type(&mut conn, id).await
    }

    /// Creates a resource type.
    pub async fn create_type(&self, input: &NewResourceType) -> DbResult<ResourceType> {
        validate_new_resource_type(input)?;

        let now = Utc::now();
        let resource_type = ResourceType {
            id: Uuid::new_v4().to_string(),
            kind: input.kind,
            name: input.name.trim().to_string(),
            price_per_hour_cents: input.price_per_hour_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %resource_type.id, name = %resource_type.name, "Inserting resource type");

        sqlx::query(
            r#"
            INSERT INTO resource_types (id, kind, name, price_per_hour_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&resource_type.id)
        .bind(resource_type.kind)
        .bind(&resource_type.name)
        .bind(resource_type.price_per_hour_cents)
        .bind(resource_type.created_at)
        .bind(resource_type.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("resource type", &input.name),
            other => other,
        })?;

        info!(target: "audit", action = "resource_type.create", id = %resource_type.id, name = %resource_type.name);
        Ok(resource_type)
    }

    /// Changes a type's hourly price. Affects sessions priced afterwards.
    pub async fn update_type_price(&self, id: &str, price_per_hour_cents: i64) -> DbResult<ResourceType> {
        venue_core::validation::validate_price_cents("price_per_hour", price_per_hour_cents)?;

        let result = sqlx::query(
            "UPDATE resource_types SET price_per_hour_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(price_per_hour_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Resource type", id));
        }

        info!(target: "audit", action = "resource_type.update_price", id = %id, price_per_hour_cents);
        self.get_type(id).await
    }

    /// Deletes a type that no instance references.
    ///
    /// ## Errors
    /// A validation error while instances still reference it.
    pub async fn delete_type(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let references: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE type_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if references > 0 {
            return Err(CoreError::Validation(ValidationError::Unexpected {
                field: "resource_type".to_string(),
                reason: format!("{} is still used by {} resources", id, references),
            })
            .into());
        }

        let result = sqlx::query("DELETE FROM resource_types WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Resource type", id));
        }

        tx.commit().await?;
        info!(target: "audit", action = "resource_type.delete", id = %id);
        Ok(())
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Lists instances, optionally of one category, by (sequence, label).
    pub async fn list_resources(&self, category: Option<ResourceCategory>) -> DbResult<Vec<Resource>> {
        let mut conn = self.pool.acquire().await?;
        list_resources(&mut conn, category).await
    }

    pub async fn get_resource(&self, id: &str) -> DbResult<Resource> {
        let mut conn = self.pool.acquire().await?;
        fetch_resource(&mut conn, id).await
    }

    /// Creates a resource instance.
    ///
    /// A type, when given, must be of the kind the category prices by.
    pub async fn create_resource(&self, input: &NewResource) -> DbResult<Resource> {
        validate_new_resource(input)?;

        let mut conn = self.pool.acquire().await?;

        if let Some(type_id) = &input.type_id {
            let resource_type = fetch_type(&mut conn, type_id).await?;
            if Some(resource_type.kind) != input.category.type_kind() {
                return Err(CoreError::Validation(ValidationError::Unexpected {
                    field: "type_id".to_string(),
                    reason: format!(
                        "a {} type cannot price a {}",
                        resource_type.kind.as_str(),
                        input.category
                    ),
                })
                .into());
            }
        }

        let resource = Resource {
            id: Uuid::new_v4().to_string(),
            category: input.category,
            label: input.label.trim().to_string(),
            sequence: input.sequence,
            type_id: input.type_id.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %resource.id, label = %resource.label, category = %resource.category, "Inserting resource");

        sqlx::query(
            r#"
            INSERT INTO resources (id, category, label, sequence, type_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&resource.id)
        .bind(resource.category)
        .bind(&resource.label)
        .bind(resource.sequence)
        .bind(&resource.type_id)
        .bind(resource.created_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("label", &resource.label),
            other => other,
        })?;

        info!(target: "audit", action = "resource.create", id = %resource.id, category = %resource.category);
        Ok(resource)
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Resource ids held by an active record of `category`.
    pub async fn active_holders(&self, category: ResourceCategory) -> DbResult<HashSet<String>> {
        let mut conn = self.pool.acquire().await?;
        active_holders(&mut conn, category).await
    }

    /// Instances of `category` free to book right now.
    pub async fn available(&self, category: ResourceCategory) -> DbResult<Vec<Resource>> {
        let mut conn = self.pool.acquire().await?;
        let instances = list_resources(&mut conn, Some(category)).await?;
        let holders = active_holders(&mut conn, category).await?;

        Ok(available_set(category, &instances, &holders)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Type id → type name, for display.
    pub async fn type_names(&self) -> DbResult<HashMap<String, String>> {
        let mut conn = self.pool.acquire().await?;
        type_names(&mut conn).await
    }
}

// =============================================================================
// Connection-level helpers (usable inside transactions)
// =============================================================================

pub async fn fetch_type(conn: &mut SqliteConnection, id: &str) -> DbResult<ResourceType> {
    let sql = format!("SELECT {} FROM resource_types WHERE id = ?1", TYPE_COLUMNS);
    sqlx::query_as::<_, ResourceType>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Resource type", id))
}

pub async fn fetch_resource(conn: &mut SqliteConnection, id: &str) -> DbResult<Resource> {
    let sql = format!("SELECT {} FROM resources WHERE id = ?1", RESOURCE_COLUMNS);
    sqlx::query_as::<_, Resource>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::not_found("Resource", id).into())
}

pub async fn list_resources(
    conn: &mut SqliteConnection,
    category: Option<ResourceCategory>,
) -> DbResult<Vec<Resource>> {
    let sql = format!(
        "SELECT {} FROM resources WHERE (?1 IS NULL OR category = ?1) ORDER BY sequence, label",
        RESOURCE_COLUMNS
    );
    let resources = sqlx::query_as::<_, Resource>(&sql)
        .bind(category)
        .fetch_all(&mut *conn)
        .await?;
    Ok(resources)
}

pub async fn active_holders(
    conn: &mut SqliteConnection,
    category: ResourceCategory,
) -> DbResult<HashSet<String>> {
    let ids: Vec<String> = match category {
        ResourceCategory::CafeTable => {
            sqlx::query_scalar(
                "SELECT table_id FROM cafe_orders WHERE state IN ('available', 'running')",
            )
            .fetch_all(&mut *conn)
            .await?
        }
        _ => {
            sqlx::query_scalar(
                r#"
                SELECT resource_id FROM sessions
                WHERE category = ?1 AND state IN ('available', 'running')
                "#,
            )
            .bind(category)
            .fetch_all(&mut *conn)
            .await?
        }
    };
    Ok(ids.into_iter().collect())
}

pub async fn type_names(conn: &mut SqliteConnection) -> DbResult<HashMap<String, String>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, name FROM resource_types")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Label, type name and hourly rate of a session's resource.
///
/// The rate comes from the type whose kind matches the category: room
/// type for private rooms, console type for consoles, table type for
/// public tables. Anything else prices at no rate.
pub async fn resource_info(
    conn: &mut SqliteConnection,
    category: ResourceCategory,
    resource_id: &str,
) -> DbResult<ResourceInfo> {
    let row: Option<(String, Option<String>, Option<ResourceTypeKind>, Option<i64>)> =
        sqlx::query_as(
            r#"
            SELECT r.label, t.name, t.kind, t.price_per_hour_cents
            FROM resources r
            LEFT JOIN resource_types t ON t.id = r.type_id
            WHERE r.id = ?1
            "#,
        )
        .bind(resource_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some((label, type_name, kind, price)) = row else {
        return Ok(ResourceInfo {
            label: "Unknown".to_string(),
            ..ResourceInfo::default()
        });
    };

    let hourly_rate = match (category.type_kind(), kind, price) {
        (Some(expected), Some(kind), Some(cents)) if expected == kind => {
            Some(Money::from_cents(cents))
        }
        _ => None,
    };

    Ok(ResourceInfo {
        label,
        type_name,
        hourly_rate,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seed_catalog, test_db};

    #[tokio::test]
    async fn test_available_set_excludes_held_instances() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;

        let free = db.catalog().available(ResourceCategory::PrivateRoom).await.unwrap();
        assert_eq!(free.len(), 2);

        db.sessions()
            .create_session(&catalog.private_session("Alice", &catalog.room.id))
            .await
            .unwrap();

        let free: Vec<String> = db
            .catalog()
            .available(ResourceCategory::PrivateRoom)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(free, vec![catalog.room2.id.clone()]);

        // Other categories are unaffected
        let consoles = db.catalog().available(ResourceCategory::PublicConsole).await.unwrap();
        assert_eq!(consoles.len(), 1);
    }

    #[tokio::test]
    async fn test_referenced_type_cannot_be_deleted() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;

        let err = db.catalog().delete_type(&catalog.deluxe.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let unused = db
            .catalog()
            .create_type(&NewResourceType {
                kind: ResourceTypeKind::Room,
                name: "Standard".to_string(),
                price_per_hour_cents: 1000,
            })
            .await
            .unwrap();
        db.catalog().delete_type(&unused.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_type_kind_must_match_category() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;

        let err = db
            .catalog()
            .create_resource(&NewResource {
                category: ResourceCategory::PublicConsole,
                label: "9".to_string(),
                sequence: 0,
                type_id: Some(catalog.deluxe.id.clone()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rate_follows_category_type() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        let info = resource_info(&mut conn, ResourceCategory::PrivateRoom, &catalog.room.id)
            .await
            .unwrap();
        assert_eq!(info.label, "VIP");
        assert_eq!(info.type_name.as_deref(), Some("Deluxe"));
        assert_eq!(info.hourly_rate, Some(Money::from_cents(2000)));

        // A room priced as if it were a console gets no rate
        let info = resource_info(&mut conn, ResourceCategory::PublicConsole, &catalog.room.id)
            .await
            .unwrap();
        assert_eq!(info.hourly_rate, None);
    }

    #[tokio::test]
    async fn test_duplicate_label_rejected() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db
            .catalog()
            .create_resource(&NewResource {
                category: ResourceCategory::CafeTable,
                label: "1".to_string(),
                sequence: 0,
                type_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
