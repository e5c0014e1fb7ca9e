//! # Error Types
//!
//! Domain-specific error types for venue-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  venue-core errors (this file)                                         │
//! │  ├── CoreError        - Reservation / billing rule violations          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  venue-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  venue-server errors                                                   │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reservation and billing rule violations.
///
/// Every variant is user-correctable or a configuration problem; none of
/// them is retried automatically.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The resource instance is already held by an active record.
    ///
    /// ## When This Occurs
    /// - Starting a session on a room that another running session holds
    /// - Opening a café order on a table with an open tab
    /// - Losing a race against a concurrent creation for the same instance
    #[error("{category} {resource_id} is already occupied")]
    ResourceOccupied {
        category: String,
        resource_id: String,
    },

    /// A resource instance does not belong to the category being booked.
    #[error("Resource {resource_id} is not a {expected}")]
    WrongResourceCategory {
        resource_id: String,
        expected: String,
    },

    /// Entity cannot be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The record is not in a state that allows the requested action.
    ///
    /// ## When This Occurs
    /// - Finishing a session that is still only reserved
    /// - Starting a café order that already runs
    /// - Adding lines to a finished record
    #[error("{entity} {id} is {state}, cannot {action}")]
    InvalidTransition {
        entity: String,
        id: String,
        state: String,
        action: String,
    },

    /// Records may only be deleted while available.
    #[error("{entity} {id} is {state} and cannot be deleted")]
    NotDeletable {
        entity: String,
        id: String,
        state: String,
    },

    /// Ending time must come strictly after starting time.
    #[error("Ending time {ending} must be after starting time {starting}")]
    InvalidTimeRange { starting: String, ending: String },

    /// Required reference data is missing (cash journal, payment method,
    /// reference sequence, time product).
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// The target already carries a posted customer invoice.
    #[error("{reference} is already invoiced ({invoice_number})")]
    AlreadyInvoiced {
        reference: String,
        invoice_number: String,
    },

    /// The target's invoice is settled; nothing remains to pay.
    #[error("{reference} is already fully paid")]
    AlreadyPaid { reference: String },

    /// An invoice could not be posted.
    #[error("Cannot post invoice: {reason}")]
    InvoicePosting { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl Into<String>,
        state: impl ToString,
        action: impl Into<String>,
    ) -> Self {
        CoreError::InvalidTransition {
            entity: entity.into(),
            id: id.into(),
            state: state.to_string(),
            action: action.into(),
        }
    }

    /// Returns true for errors the caller can fix by changing the input.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CoreError::MissingConfiguration(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A field is set that the other inputs forbid.
    #[error("{field} is not allowed {reason}")]
    Unexpected { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ResourceOccupied {
            category: "private_room".to_string(),
            resource_id: "room-1".to_string(),
        };
        assert_eq!(err.to_string(), "private_room room-1 is already occupied");

        let err = CoreError::NotDeletable {
            entity: "Session".to_string(),
            id: "ROOM/00001".to_string(),
            state: "running".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Session ROOM/00001 is running and cannot be deleted"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("customer").to_string(),
            "customer is required"
        );

        let err = ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10000,
        };
        assert_eq!(err.to_string(), "discount must be between 0 and 10000");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("table").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_user_error());
        assert!(!CoreError::MissingConfiguration("cash journal".into()).is_user_error());
    }
}
