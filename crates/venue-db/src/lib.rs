//! # venue-db: Database Layer for the Venue Backend
//!
//! Every SQL statement and transaction of the reservation and billing
//! engine. SQLite through sqlx, with embedded migrations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Venue Data Flow                                  │
//! │                                                                         │
//! │  HTTP handler (POST /sessions)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     venue-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SessionRepo   │    │ 001_schema   │  │   │
//! │  │   │ SqlitePool    │◄───│ CafeOrderRepo │    │ 002_seed     │  │   │
//! │  │   │ WAL, FKs      │    │ BillingRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                              │                                  │   │
//! │  │                              ▼                                  │   │
//! │  │                 venue-core rules (pure functions)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use venue_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("venue.db")).await?;
//! let free = db.catalog().available(ResourceCategory::PrivateRoom).await?;
//! let session = db.sessions().create_session(&input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::billing::{BillingOutcome, BillingRepository};
pub use repository::cafe_order::CafeOrderRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::session::SessionRepository;
