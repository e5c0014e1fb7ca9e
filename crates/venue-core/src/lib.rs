//! # venue-core: Pure Business Logic for the Venue Backend
//!
//! Reservation rules, pricing, billing decisions and analytics derivations
//! for a gaming venue (private rooms, public consoles and tables, café).
//! Everything here is a pure function of its inputs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Venue Backend Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 venue-server (axum HTTP API)                    │   │
//! │  │   /sessions  /cafe-orders  /billing  /dashboard  /reports       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ venue-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ lifecycle │  │  pricing  │  │  billing  │  │ dashboard │  │   │
//! │  │   │ available │  │ lines     │  │ plan      │  │ report    │  │   │
//! │  │   │ running   │  │ time      │  │ draft     │  │ charts    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 venue-db (SQLite persistence)                   │   │
//! │  │        migrations, sequences, transactions, repositories        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Session, CafeOrder, LineItem, Invoice, ...)
//! - [`money`] - Integer money with time proration and discounts
//! - [`pricing`] - Line amounts, time price, totals
//! - [`lifecycle`] - State transitions and time checks
//! - [`availability`] - Available sets and occupancy
//! - [`detail`] - Records with derived amounts
//! - [`billing`] - Billing target capability, invoice drafts, billing plans
//! - [`dashboard`] - Dashboard windows, stats, activity feed, charts, actions
//! - [`report`] - Date-partitioned reporting rows
//! - [`time`] - Viewer time zone helpers
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use venue_core::money::Money;
//! use venue_core::pricing::time_price;
//! use chrono::{Duration, Utc};
//!
//! let start = Utc::now();
//! let price = time_price(start, Some(start + Duration::minutes(90)), Some(Money::from_cents(2000)));
//! assert_eq!(price.cents(), 3000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod billing;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod report;
pub mod time;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::{BillingTarget, TargetRef};
pub use detail::{CafeOrderDetail, ResourceInfo, SessionDetail};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single line.
///
/// Catches typos such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Upper bound for any price in cents (10,000,000.00).
///
/// Keeps `quantity × price` and every total far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// SKU of the built-in product used for the time line on session invoices.
pub const TIME_SPENT_SKU: &str = "TIME-SPENT";

/// How far back the dashboard activity feed looks.
pub const ACTIVITY_WINDOW_HOURS: i64 = 2;

/// Activity feed length.
pub const MAX_ACTIVITIES: usize = 10;

/// Café orders considered for the activity feed.
pub const MAX_CAFE_ACTIVITIES: usize = 5;

/// Invoice currency when none is configured.
pub const DEFAULT_CURRENCY: &str = "USD";
