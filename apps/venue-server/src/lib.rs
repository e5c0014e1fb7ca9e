//! # Venue Server Library
//!
//! HTTP API over the reservation and billing engine.
//!
//! ## Module Organization
//! ```text
//! venue_server/
//! ├── lib.rs          ◄─── You are here (tracing, router assembly)
//! ├── main.rs         ◄─── Startup and graceful shutdown
//! ├── config.rs       ◄─── Layered configuration
//! ├── error.rs        ◄─── API error type and HTTP status mapping
//! ├── state.rs        ◄─── Shared handler state
//! ├── scheduler.rs    ◄─── Reservation sweeper
//! └── routes/
//!     ├── mod.rs      ◄─── Router + /health
//!     ├── dashboard.rs
//!     ├── catalog.rs
//!     ├── sessions.rs
//!     ├── cafe_orders.rs
//!     ├── billing.rs
//!     └── reports.rs
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TraceLayer ──► Router ──► handler ──► venue-db repository ──► SQLite  │
//! │                               │                                         │
//! │                               └── Err(DbError) ──► ApiError ──► JSON   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, VenueConfig};
pub use error::{ApiError, ErrorCode};
pub use scheduler::{ReservationSweeper, SweeperHandle};
pub use state::AppState;

/// Builds the application with request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=audit=info` - Audit events only
/// - Default: `info,venue=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,venue=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
