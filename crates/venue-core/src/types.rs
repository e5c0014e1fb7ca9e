//! # Domain Types
//!
//! Core domain types used throughout the venue backend.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                Reservations              Accounting            │
//! │  ─────────────────      ─────────────────         ──────────────────    │
//! │  ResourceType ◄──┐      Session ──┐               Invoice               │
//! │   kind, price/h  │       ref code │                ├── InvoiceLine      │
//! │                  │       state    ├─► LineItem     └── Payment          │
//! │  Resource ───────┘      CafeOrder ┘    qty, price  Journal              │
//! │   category, label        ref code      discount    PaymentMethod        │
//! │                                                                         │
//! │  Product (sku, list price) ──► LineItem.unit_price default             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (`reference`, `sku`, invoice `number`) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Line discount in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. A discount of 12.5% is 1250 bps, so percentages
/// with two decimals stay exact integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a discount from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Whether a session rents a whole room or a single public station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Public,
    Private,
}

/// The station kind of a public session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum IndividualType {
    Console,
    Table,
}

/// Kind of a priced resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTypeKind {
    Room,
    Console,
    Table,
}

impl ResourceTypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceTypeKind::Room => "room",
            ResourceTypeKind::Console => "console",
            ResourceTypeKind::Table => "table",
        }
    }
}

/// The partition over which occupancy exclusivity is enforced.
///
/// ## Category Resolution
/// ```text
/// session_type = private                        → PrivateRoom
/// session_type = public, individual = console   → PublicConsole
/// session_type = public, individual = table     → PublicTable
/// café order                                    → CafeTable
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    PrivateRoom,
    PublicConsole,
    PublicTable,
    CafeTable,
}

impl ResourceCategory {
    /// Every category, in dashboard order.
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::PrivateRoom,
        ResourceCategory::PublicConsole,
        ResourceCategory::PublicTable,
        ResourceCategory::CafeTable,
    ];

    /// Resolves the category a session books.
    ///
    /// ## Errors
    /// - public session without `individual_type`
    /// - private session with an `individual_type`
    pub fn for_session(
        session_type: SessionType,
        individual_type: Option<IndividualType>,
    ) -> Result<Self, ValidationError> {
        match (session_type, individual_type) {
            (SessionType::Private, None) => Ok(ResourceCategory::PrivateRoom),
            (SessionType::Private, Some(_)) => Err(ValidationError::Unexpected {
                field: "individual_type".to_string(),
                reason: "on a private session".to_string(),
            }),
            (SessionType::Public, Some(IndividualType::Console)) => {
                Ok(ResourceCategory::PublicConsole)
            }
            (SessionType::Public, Some(IndividualType::Table)) => Ok(ResourceCategory::PublicTable),
            (SessionType::Public, None) => Err(ValidationError::required("individual_type")),
        }
    }

    /// The type kind whose hourly price applies, `None` for café tables.
    pub fn type_kind(&self) -> Option<ResourceTypeKind> {
        match self {
            ResourceCategory::PrivateRoom => Some(ResourceTypeKind::Room),
            ResourceCategory::PublicConsole => Some(ResourceTypeKind::Console),
            ResourceCategory::PublicTable => Some(ResourceTypeKind::Table),
            ResourceCategory::CafeTable => None,
        }
    }

    /// Name of the reference-code counter for records in this category.
    pub fn sequence_code(&self) -> &'static str {
        match self {
            ResourceCategory::PrivateRoom => "session.private",
            ResourceCategory::PublicConsole => "session.console",
            ResourceCategory::PublicTable => "session.table",
            ResourceCategory::CafeTable => "cafe.order",
        }
    }

    /// Human-facing location name for a resource label.
    ///
    /// Rooms are named by their label; stations by kind and number.
    pub fn location_name(&self, label: &str) -> String {
        match self {
            ResourceCategory::PrivateRoom => label.to_string(),
            ResourceCategory::PublicConsole => format!("Console {}", label),
            ResourceCategory::PublicTable | ResourceCategory::CafeTable => {
                format!("Table {}", label)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::PrivateRoom => "private_room",
            ResourceCategory::PublicConsole => "public_console",
            ResourceCategory::PublicTable => "public_table",
            ResourceCategory::CafeTable => "cafe_table",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: ResourceCategory::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
    }
}

/// Lifecycle state shared by sessions and café orders.
///
/// ```text
///  available ──start──► running ──finish──► finished
///     │
///     └── delete (only here)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Holds its resource but has not started yet.
    Available,
    /// In progress.
    Running,
    /// Closed; ready for billing.
    Finished,
}

impl RecordState {
    /// Active records hold their resource instance.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RecordState::Available | RecordState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordState::Available => "available",
            RecordState::Running => "running",
            RecordState::Finished => "finished",
        }
    }
}

impl Default for RecordState {
    fn default() -> Self {
        RecordState::Available
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(RecordState::Available),
            "running" => Ok(RecordState::Running),
            "finished" => Ok(RecordState::Finished),
            _ => Err(ValidationError::NotAllowed {
                field: "state".to_string(),
                allowed: vec![
                    "available".to_string(),
                    "running".to_string(),
                    "finished".to_string(),
                ],
            }),
        }
    }
}

/// How the customer settles a billing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentWay {
    /// Invoice and pay the whole amount now.
    FullyPaid,
    /// Pay part now; invoice is created on first use.
    PartiallyPaid,
    /// Invoice now, pay later.
    LaterPaid,
}

/// Payment state of a posted invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    NotPaid,
    Partial,
    Paid,
}

impl PaymentState {
    /// Derives the state from the invoice total and what has been paid.
    pub fn from_amounts(total: Money, paid: Money) -> Self {
        if !paid.is_positive() {
            PaymentState::NotPaid
        } else if paid < total {
            PaymentState::Partial
        } else {
            PaymentState::Paid
        }
    }
}

/// Invoice document state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    Draft,
    Posted,
}

/// What a line item or an invoice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Session,
    CafeOrder,
}

impl TargetKind {
    /// Entity name used in error messages.
    pub fn entity_name(&self) -> &'static str {
        match self {
            TargetKind::Session => "Session",
            TargetKind::CafeOrder => "Cafe order",
        }
    }
}

/// Journal type of an accounting journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum JournalType {
    Cash,
    Bank,
    Sale,
}

/// Direction of a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    Inbound,
    Outbound,
}

// =============================================================================
// Catalog
// =============================================================================

/// A priced kind of room, console or table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ResourceType {
    pub id: String,
    pub kind: ResourceTypeKind,
    pub name: String,
    /// Hourly price in cents.
    pub price_per_hour_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ResourceType {
    #[inline]
    pub fn price_per_hour(&self) -> Money {
        Money::from_cents(self.price_per_hour_cents)
    }
}

/// A bookable instance: room, console, table or café table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Resource {
    pub id: String,
    pub category: ResourceCategory,
    /// Room name, console number or table number.
    pub label: String,
    /// Ordering hint for lists.
    pub sequence: i64,
    /// Priced type; always `None` for café tables.
    pub type_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sellable product for session and café lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    /// List price in cents; default unit price on new lines.
    pub list_price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn list_price(&self) -> Money {
        Money::from_cents(self.list_price_cents)
    }
}

// =============================================================================
// Reservations
// =============================================================================

/// Occupancy of exactly one resource instance over a time interval.
///
/// The `(category, resource_id)` pair replaces three nullable
/// room/console/table references, so exactly one is always set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Session {
    pub id: String,
    /// Reference code, e.g. `ROOM/00042`. Immutable.
    pub reference: String,
    pub customer: String,
    pub session_type: SessionType,
    pub individual_type: Option<IndividualType>,
    pub category: ResourceCategory,
    pub resource_id: String,
    #[ts(as = "String")]
    pub starting_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub ending_time: Option<DateTime<Utc>>,
    pub state: RecordState,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A café tab tied to a café table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CafeOrder {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub table_id: String,
    pub state: RecordState,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A priced, discountable product quantity on a session or café order.
///
/// Product name is snapshotted so history survives catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub owner_kind: TargetKind,
    pub owner_id: String,
    pub product_id: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Accounting
// =============================================================================

/// A customer invoice for a session or café order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Invoice number, e.g. `INV/00007`.
    pub number: String,
    pub target_kind: TargetKind,
    pub target_id: String,
    pub customer: String,
    /// Reference code of the billed record.
    pub reference: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub currency: String,
    pub state: InvoiceState,
    pub amount_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Invoice {
    #[inline]
    pub fn amount_total(&self) -> Money {
        Money::from_cents(self.amount_total_cents)
    }
}

/// One invoice line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceLine {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub label: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    pub subtotal_cents: i64,
}

/// A payment registered against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub journal_id: String,
    pub payment_method_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Accounting journal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Journal {
    pub id: String,
    pub code: String,
    pub name: String,
    pub journal_type: JournalType,
}

/// Payment method available on a journal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethod {
    pub id: String,
    pub journal_id: String,
    pub code: String,
    pub name: String,
    pub direction: PaymentDirection,
}

// =============================================================================
// Inputs
// =============================================================================

/// Input for creating or reserving a session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSession {
    pub customer: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub individual_type: Option<IndividualType>,
    /// Room, console or table id, matching the session's category.
    pub resource_id: String,
}

/// Input for opening a café order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCafeOrder {
    pub customer: String,
    pub table_id: String,
}

/// Input for adding a line to a session or café order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the product's list price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub discount_bps: Option<u32>,
}

/// Input for a resource type.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewResourceType {
    pub kind: ResourceTypeKind,
    pub name: String,
    pub price_per_hour_cents: i64,
}

/// Input for a resource instance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewResource {
    pub category: ResourceCategory,
    pub label: String,
    #[serde(default)]
    pub sequence: i64,
    #[serde(default)]
    pub type_id: Option<String>,
}

/// Input for a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub list_price_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
