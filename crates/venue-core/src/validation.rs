//! # Validation Module
//!
//! Input validation for everything a client can send.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (venue-server)                                  │
//! │  └── Type validation (serde deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules: names, quantities, prices, discounts                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK / NOT NULL / UNIQUE constraints                             │
//! │  └── Partial unique index: one active record per resource              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use venue_core::validation::{validate_customer, validate_quantity};
//!
//! validate_customer("Alice").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{DiscountRate, NewLineItem, NewProduct, NewResource, NewResourceType};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer of a session or café order.
///
/// ## Rules
/// - Must not be empty
/// - At most 120 characters
pub fn validate_customer(customer: &str) -> ValidationResult<()> {
    required_text("customer", customer, 120)
}

/// Validates a resource label (room name, console or table number).
pub fn validate_label(label: &str) -> ValidationResult<()> {
    required_text("label", label, 60)
}

/// Validates a resource type name.
pub fn validate_type_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 100)
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use venue_core::validation::validate_sku;
///
/// assert!(validate_sku("COLA-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required_text("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 200)
}

/// Validates an ISO 4217 currency code such as `USD`.
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a 3-letter uppercase code".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Flow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Session: Add Line                                                      │
/// │                                                                         │
/// │  Staff enters quantity: 5                                              │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: out of range                             │
/// │       └── OK → line is stored                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents: zero up to `MAX_PRICE_CENTS`.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a discount in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > DiscountRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: DiscountRate::MAX_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Input Validators
// =============================================================================

pub fn validate_new_line(input: &NewLineItem) -> ValidationResult<()> {
    validate_quantity(input.quantity)?;
    if let Some(price) = input.unit_price_cents {
        validate_price_cents("unit_price", price)?;
    }
    if let Some(bps) = input.discount_bps {
        validate_discount_bps(bps)?;
    }
    Ok(())
}

pub fn validate_new_resource_type(input: &NewResourceType) -> ValidationResult<()> {
    validate_type_name(&input.name)?;
    validate_price_cents("price_per_hour", input.price_per_hour_cents)
}

/// Café tables carry no type; every other category may.
pub fn validate_new_resource(input: &NewResource) -> ValidationResult<()> {
    validate_label(&input.label)?;
    if input.category.type_kind().is_none() && input.type_id.is_some() {
        return Err(ValidationError::Unexpected {
            field: "type_id".to_string(),
            reason: format!("on a {}", input.category),
        });
    }
    Ok(())
}

pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_sku(&input.sku)?;
    validate_product_name(&input.name)?;
    validate_price_cents("list_price", input.list_price_cents)
}

// =============================================================================
// Unit Tests
// =============================================================================
