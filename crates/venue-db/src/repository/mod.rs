//! # Repository Module
//!
//! Data access for every venue entity.
//!
//! ## Repositories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Repositories                                   │
//! │                                                                         │
//! │  CatalogRepository    resource types, instances, availability          │
//! │  ProductRepository    sellable products                                │
//! │  SessionRepository    reservations + lines + lifecycle                 │
//! │  CafeOrderRepository  café tabs + lines + lifecycle                    │
//! │  BillingRepository    invoice + payment workflow                       │
//! │  ReportRepository     session / café report rows                       │
//! │  DashboardRepository  stats, resource board, activity, chart           │
//! │                                                                         │
//! │  Shared helpers (take &mut SqliteConnection, run inside callers' tx):  │
//! │  sequence · line_item · invoice                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod billing;
pub mod cafe_order;
pub mod catalog;
pub mod dashboard;
pub mod invoice;
pub mod line_item;
pub mod product;
pub mod report;
pub mod sequence;
pub mod session;

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use venue_core::{
        IndividualType, NewCafeOrder, NewProduct, NewResource, NewResourceType, NewSession,
        Product, Resource, ResourceCategory, ResourceType, ResourceTypeKind, SessionType,
    };

    use crate::pool::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A WAL database on disk with a real multi-connection pool.
    ///
    /// Keep the returned directory alive for the duration of the test.
    pub async fn file_db(connections: u32) -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("venue.db")).max_connections(connections),
        )
        .await
        .unwrap();
        (db, dir)
    }

    /// A small venue: two rooms, one console, one pool table, one café
    /// table and a snack.
    pub struct Catalog {
        pub deluxe: ResourceType,
        pub ps5: ResourceType,
        pub pool: ResourceType,
        pub room: Resource,
        pub room2: Resource,
        pub console: Resource,
        pub table: Resource,
        pub cafe_table: Resource,
        pub snack: Product,
    }

    impl Catalog {
        pub fn private_session(&self, customer: &str, room_id: &str) -> NewSession {
            NewSession {
                customer: customer.to_string(),
                session_type: SessionType::Private,
                individual_type: None,
                resource_id: room_id.to_string(),
            }
        }

        pub fn console_session(&self, customer: &str) -> NewSession {
            NewSession {
                customer: customer.to_string(),
                session_type: SessionType::Public,
                individual_type: Some(IndividualType::Console),
                resource_id: self.console.id.clone(),
            }
        }

        pub fn table_session(&self, customer: &str) -> NewSession {
            NewSession {
                customer: customer.to_string(),
                session_type: SessionType::Public,
                individual_type: Some(IndividualType::Table),
                resource_id: self.table.id.clone(),
            }
        }

        pub fn cafe_order(&self, customer: &str) -> NewCafeOrder {
            NewCafeOrder {
                customer: customer.to_string(),
                table_id: self.cafe_table.id.clone(),
            }
        }
    }

    async fn resource_type(db: &Database, kind: ResourceTypeKind, name: &str, cents: i64) -> ResourceType {
        db.catalog()
            .create_type(&NewResourceType {
                kind,
                name: name.to_string(),
                price_per_hour_cents: cents,
            })
            .await
            .unwrap()
    }

    async fn resource(
        db: &Database,
        category: ResourceCategory,
        label: &str,
        sequence: i64,
        type_id: Option<&str>,
    ) -> Resource {
        db.catalog()
            .create_resource(&NewResource {
                category,
                label: label.to_string(),
                sequence,
                type_id: type_id.map(str::to_string),
            })
            .await
            .unwrap()
    }

    pub async fn seed_catalog(db: &Database) -> Catalog {
        let deluxe = resource_type(db, ResourceTypeKind::Room, "Deluxe", 2000).await;
        let ps5 = resource_type(db, ResourceTypeKind::Console, "PS5", 1500).await;
        let pool = resource_type(db, ResourceTypeKind::Table, "Pool", 1000).await;

        let room = resource(db, ResourceCategory::PrivateRoom, "VIP", 1, Some(&deluxe.id)).await;
        let room2 = resource(db, ResourceCategory::PrivateRoom, "Arena", 2, Some(&deluxe.id)).await;
        let console = resource(db, ResourceCategory::PublicConsole, "1", 1, Some(&ps5.id)).await;
        let table = resource(db, ResourceCategory::PublicTable, "1", 1, Some(&pool.id)).await;
        let cafe_table = resource(db, ResourceCategory::CafeTable, "1", 1, None).await;

        let snack = db
            .products()
            .create(&NewProduct {
                sku: "SNACK-01".to_string(),
                name: "Chips".to_string(),
                list_price_cents: 500,
            })
            .await
            .unwrap();

        Catalog {
            deluxe,
            ps5,
            pool,
            room,
            room2,
            console,
            table,
            cafe_table,
            snack,
        }
    }
}
