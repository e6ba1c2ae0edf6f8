//! # Error Types
//!
//! Domain-specific error types for evently-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  evently-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule failures                         │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CouponRejection  - The six coupon failure reasons (coupon.rs)     │
//! │                                                                         │
//! │  evently-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  App errors (apps/evently)                                             │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::coupon::CouponRejection;
use crate::types::{ReservationStatus, TicketStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Storage code raises them
/// from inside transactions, so the checkout can abort with a precise reason.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Event has no seats left.
    ///
    /// ## User Workflow
    /// ```text
    /// Purchase (event: 500/500)
    ///      │
    ///      ▼
    /// UPDATE events ... WHERE attendees < max_attendees  → 0 rows
    ///      │
    ///      ▼
    /// EventFull { event_id, max_attendees: 500 }
    /// ```
    #[error("Event {event_id} is full ({max_attendees} attendees)")]
    EventFull { event_id: String, max_attendees: i64 },

    /// Ticket status does not allow the requested transition.
    ///
    /// ## When This Occurs
    /// - Checking in a ticket that was already used
    /// - Checking in or cancelling a cancelled ticket
    /// - Cancelling a ticket that was already used
    #[error("Ticket {ticket_id} is {current}, cannot {action}")]
    InvalidTicketTransition {
        ticket_id: String,
        current: TicketStatus,
        action: &'static str,
    },

    /// Capacity cannot drop below the number of registered attendees.
    #[error("Max attendees {requested} is below current attendees ({attendees})")]
    CapacityBelowAttendees { requested: i64, attendees: i64 },

    /// Reservation was already committed or released.
    #[error("Reservation {reservation_id} is {status}, expected pending")]
    ReservationNotPending {
        reservation_id: String,
        status: ReservationStatus,
    },

    /// Coupon failed one of its checks.
    #[error("{0}")]
    CouponRejected(#[from] CouponRejection),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., email already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Password failed one or more strength rules.
    ///
    /// Every failed rule is reported, not just the first.
    #[error("Password is too weak: {}", joined(.failures))]
    WeakPassword { failures: Vec<String> },
}

fn joined(failures: &[String]) -> String {
    failures.join("; ")
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
