//! # API Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Evently                                │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Database Error? ──── DbError::QueryFailed("...") ────┐                │
//! │         │                                             │                │
//! │         ▼                                             ▼                │
//! │  Rule failure? ────── CoreError::EventFull ──────── ApiError ────────► │
//! │         │                                             ▲                │
//! │         ▼                                             │                │
//! │  Service failure? ─── ServiceError::CardDeclined ─────┘                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ─────────────────────────────────────────────────────────────► │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! Callers receive both a machine-readable `code` and a human-readable
//! `message`:
//! ```json
//! { "code": "COUPON_REJECTED", "message": "Coupon usage limit reached" }
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::services::ServiceError;
use crate::state::ConfigError;
use evently_core::{CoreError, TicketStatus, ValidationError};
use evently_db::DbError;

/// Error returned from commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate email or coupon code (409)
    Conflict,

    /// No session, or bad credentials (401)
    Unauthorized,

    /// Signed in with the wrong role (403)
    Forbidden,

    /// No seats left
    EventFull,

    /// Coupon failed one of its checks
    CouponRejected,

    /// Ticket is used or cancelled
    InvalidTicketState,

    /// Business rule failure not covered above (422)
    BusinessLogic,

    /// Card declined or transfer refused
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } if field == "email" => {
                ApiError::new(ErrorCode::Conflict, "Email already exists")
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            DbError::Domain(core) => ApiError::from(core),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Constraint violation: {}", message);
                ApiError::new(ErrorCode::BusinessLogic, "Operation violates a data constraint")
            }
            DbError::Corrupt { entity, id, reason } => {
                tracing::error!(entity = %entity, id = %id, "Corrupt record: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Stored data is corrupt")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EventFull { .. } => ApiError::new(ErrorCode::EventFull, "Event is full"),
            CoreError::InvalidTicketTransition { current, .. } => {
                let message = match current {
                    TicketStatus::Used => "Ticket already used",
                    TicketStatus::Cancelled => "Ticket cancelled",
                    TicketStatus::Active => "Ticket is active",
                };
                ApiError::new(ErrorCode::InvalidTicketState, message)
            }
            CoreError::CouponRejected(rejection) => {
                ApiError::new(ErrorCode::CouponRejected, rejection.to_string())
            }
            err @ CoreError::CapacityBelowAttendees { .. } => {
                ApiError::new(ErrorCode::ValidationError, err.to_string())
            }
            err @ CoreError::ReservationNotPending { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::from(e),
            err @ (ServiceError::CardDeclined | ServiceError::TransferRejected(_)) => {
                ApiError::new(ErrorCode::PaymentError, err.to_string())
            }
            ServiceError::EmailFailed(e) => {
                tracing::error!("Email delivery failed: {}", e);
                ApiError::internal("Email delivery failed")
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!("Configuration error: {}", err);
        ApiError::internal(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use evently_core::CouponRejection;

    #[test]
    fn test_serialization() {
        let err = ApiError::new(ErrorCode::CouponRejected, "Coupon usage limit reached");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            r#"{"code":"COUPON_REJECTED","message":"Coupon usage limit reached"}"#
        );
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::duplicate("email", "ada@example.com").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "Email already exists");

        let err: ApiError = DbError::not_found("Ticket", "TKT-1").into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = DbError::QueryFailed("syntax error near SELECT".into()).into();
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_ticket_messages() {
        let err: ApiError = CoreError::InvalidTicketTransition {
            ticket_id: "TKT-1".to_string(),
            current: TicketStatus::Used,
            action: "check in",
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvalidTicketState);
        assert_eq!(err.message, "Ticket already used");

        let err: ApiError = DbError::Domain(CoreError::InvalidTicketTransition {
            ticket_id: "TKT-1".to_string(),
            current: TicketStatus::Cancelled,
            action: "check in",
        })
        .into();
        assert_eq!(err.message, "Ticket cancelled");
    }

    #[test]
    fn test_coupon_and_payment_mapping() {
        let err: ApiError = DbError::Domain(CouponRejection::NotApplicable.into()).into();
        assert_eq!(err.code, ErrorCode::CouponRejected);
        assert_eq!(err.message, "Coupon is not applicable for this event");

        let err: ApiError = ServiceError::CardDeclined.into();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(err.message, "Payment declined. Please check your card details.");
    }
}
