//! # Validation Module
//!
//! Input validation for Evently.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command (apps/evently)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (email, coupon code)                           │
//! │  └── Conditional updates (capacity, coupon uses)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use evently_core::validation::{validate_email, validate_password};
//!
//! assert!(validate_email("ada@example.com").is_ok());
//! assert!(validate_password("Secret12!").is_ok());
//! assert!(validate_password("secret").is_err());
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{BankAccount, DiscountType, EventUpdate, NewCoupon, NewEvent};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest capacity an event may declare.
pub const MAX_EVENT_CAPACITY: i64 = 1_000_000;

/// Largest ticket price or minimum purchase, in cents ($1,000,000).
///
/// Fee quotes are only defined for subtotals up to this value.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Characters that satisfy the password special-character rule.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

// =============================================================================
// String Validators
// =============================================================================

/// Non-empty after trimming, at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty is allowed and means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an email address.
///
/// ## Rules
/// - exactly one `@`, non-empty local part
/// - domain contains a dot that is neither first nor last
/// - no whitespace
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(invalid("must contain a single @")),
    };

    if local.is_empty() {
        return Err(invalid("missing name before @"));
    }

    match domain.find('.') {
        Some(i) if i > 0 && !domain.ends_with('.') => Ok(()),
        _ => Err(invalid("domain must look like example.com")),
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Strength label for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
}

/// Score out of five plus its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: StrengthLabel,
}

/// The five password rules with their failure messages.
fn password_rules(password: &str) -> [(bool, &'static str); 5] {
    [
        (
            password.chars().count() >= 8,
            "Password must be at least 8 characters long",
        ),
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Password must contain at least one lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Password must contain at least one uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Password must contain at least one number",
        ),
        (
            password.chars().any(|c| PASSWORD_SPECIALS.contains(c)),
            "Password must contain at least one special character (@$!%*?&)",
        ),
    ]
}

/// Checks every rule and reports all failures at once.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let failures: Vec<String> = password_rules(password)
        .iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, msg)| msg.to_string())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword { failures })
    }
}

/// One point per satisfied rule. Below 2 is weak, below 4 is medium.
pub fn password_strength(password: &str) -> PasswordStrength {
    let score = password_rules(password).iter().filter(|(ok, _)| *ok).count() as u8;
    let label = match score {
        0 | 1 => StrengthLabel::Weak,
        2 | 3 => StrengthLabel::Medium,
        _ => StrengthLabel::Strong,
    };
    PasswordStrength { score, label }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Zero (free) is allowed, up to [`MAX_PRICE_CENTS`].
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a payment amount in cents. Must be positive.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

pub fn validate_max_attendees(max: i64) -> ValidationResult<()> {
    if !(1..=MAX_EVENT_CAPACITY).contains(&max) {
        return Err(ValidationError::OutOfRange {
            field: "max_attendees".to_string(),
            min: 1,
            max: MAX_EVENT_CAPACITY,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates the fields of a new event.
pub fn validate_new_event(event: &NewEvent) -> ValidationResult<()> {
    validate_text("title", &event.title, 200)?;
    validate_text("description", &event.description, 5_000)?;
    validate_text("category", &event.category, 50)?;
    validate_text("date", &event.date, 50)?;
    validate_text("time", &event.time, 50)?;
    validate_text("location", &event.location, 200)?;

    if let Some(max) = event.max_attendees {
        validate_max_attendees(max)?;
    }
    if let Some(price) = event.price_cents {
        validate_price_cents(price)?;
    }

    Ok(())
}

/// Validates only the fields an update sets.
pub fn validate_event_update(update: &EventUpdate) -> ValidationResult<()> {
    let texts = [
        ("title", &update.title, 200),
        ("description", &update.description, 5_000),
        ("category", &update.category, 50),
        ("date", &update.date, 50),
        ("time", &update.time, 50),
        ("location", &update.location, 200),
    ];
    for (field, value, max) in texts {
        if let Some(value) = value {
            validate_text(field, value, max)?;
        }
    }

    if let Some(max) = update.max_attendees {
        validate_max_attendees(max)?;
    }
    if let Some(price) = update.price_cents {
        validate_price_cents(price)?;
    }

    Ok(())
}

/// Coupon codes: 3 to 32 letters, digits, hyphens or underscores.
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: 3,
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a coupon before it is stored.
pub fn validate_new_coupon(coupon: &NewCoupon) -> ValidationResult<()> {
    validate_coupon_code(&coupon.code)?;

    match coupon.discount_type {
        DiscountType::Percentage if !(1..=10_000).contains(&coupon.discount_value) => {
            return Err(ValidationError::OutOfRange {
                field: "discount_value".to_string(),
                min: 1,
                max: 10_000,
            });
        }
        DiscountType::Fixed if coupon.discount_value <= 0 => {
            return Err(ValidationError::MustBePositive {
                field: "discount_value".to_string(),
            });
        }
        _ => {}
    }

    if coupon.usage_limit <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "usage_limit".to_string(),
        });
    }

    if let Some(min) = coupon.min_purchase_cents {
        validate_price_cents(min)?;
    }
    if let Some(max) = coupon.max_discount_cents {
        if max <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "max_discount".to_string(),
            });
        }
    }

    if coupon.valid_until < coupon.valid_from {
        return Err(ValidationError::InvalidFormat {
            field: "valid_until".to_string(),
            reason: "must not be before valid_from".to_string(),
        });
    }

    Ok(())
}

/// Bank details for a transfer.
///
/// ## Rules
/// - account number: 8 to 17 ASCII letters or digits
/// - routing number: exactly 9 digits
pub fn validate_bank_account(account: &BankAccount) -> ValidationResult<()> {
    let number = account.account_number.trim();
    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "account_number".to_string(),
        });
    }
    if number.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "account_number".to_string(),
            min: 8,
        });
    }
    if number.len() > 17 {
        return Err(ValidationError::TooLong {
            field: "account_number".to_string(),
            max: 17,
        });
    }
    if !number.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "account_number".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    let routing = account.routing_number.trim();
    if routing.is_empty() {
        return Err(ValidationError::Required {
            field: "routing_number".to_string(),
        });
    }
    if routing.len() != 9 || !routing.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "routing_number".to_string(),
            reason: "must be exactly 9 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use evently_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountType, CouponType};
    use chrono::{Duration, Utc};

    fn new_event() -> NewEvent {
        NewEvent {
            title: "Rust Meetup".to_string(),
            description: "Talks and pizza".to_string(),
            category: "Technology".to_string(),
            date: "May 1, 2025".to_string(),
            time: "6:00 PM".to_string(),
            location: "Berlin".to_string(),
            ..Default::default()
        }
    }

    fn bank(account: &str, routing: &str) -> BankAccount {
        BankAccount {
            account_number: account.to_string(),
            routing_number: routing.to_string(),
            account_type: AccountType::Checking,
            bank_name: "Chase Bank".to_string(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("ada@.com").is_err());
        assert!(validate_email("ada @example.com").is_err());
    }

    #[test]
    fn test_password_rules_report_every_failure() {
        assert!(validate_password("Secret12!").is_ok());

        match validate_password("abc") {
            Err(ValidationError::WeakPassword { failures }) => {
                assert_eq!(failures.len(), 4);
                assert!(failures[0].contains("8 characters"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_password_strength_labels() {
        assert_eq!(password_strength("").label, StrengthLabel::Weak);
        assert_eq!(password_strength("a").score, 1);
        assert_eq!(password_strength("aB").label, StrengthLabel::Medium);
        assert_eq!(password_strength("aB1").label, StrengthLabel::Medium);
        assert_eq!(password_strength("aB1!").label, StrengthLabel::Strong);
        assert_eq!(password_strength("Secret12!").score, 5);
    }

    #[test]
    fn test_validate_new_event() {
        assert!(validate_new_event(&new_event()).is_ok());

        let missing_title = NewEvent {
            title: "  ".to_string(),
            ..new_event()
        };
        assert_eq!(
            validate_new_event(&missing_title),
            Err(ValidationError::Required {
                field: "title".to_string()
            })
        );

        let zero_capacity = NewEvent {
            max_attendees: Some(0),
            ..new_event()
        };
        assert!(validate_new_event(&zero_capacity).is_err());

        let negative_price = NewEvent {
            price_cents: Some(-1),
            ..new_event()
        };
        assert!(validate_new_event(&negative_price).is_err());

        let huge_price = NewEvent {
            price_cents: Some(i64::MAX - 10),
            ..new_event()
        };
        assert!(validate_new_event(&huge_price).is_err());
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price_cents(MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
    }

    #[test]
    fn test_validate_event_update_checks_only_set_fields() {
        assert!(validate_event_update(&EventUpdate::default()).is_ok());
        let blank = EventUpdate {
            location: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_event_update(&blank).is_err());
    }

    #[test]
    fn test_validate_bank_account() {
        assert!(validate_bank_account(&bank("12345678", "021000021")).is_ok());
        assert!(validate_bank_account(&bank("ABC12345678901234", "021000021")).is_ok());

        assert!(validate_bank_account(&bank("1234567", "021000021")).is_err());
        assert!(validate_bank_account(&bank("123456789012345678", "021000021")).is_err());
        assert!(validate_bank_account(&bank("1234-5678", "021000021")).is_err());
        assert!(validate_bank_account(&bank("12345678", "02100002")).is_err());
        assert!(validate_bank_account(&bank("12345678", "02100002A")).is_err());
    }

    #[test]
    fn test_validate_new_coupon() {
        let now = Utc::now();
        let coupon = NewCoupon {
            code: "SPRING25".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 2_500,
            min_purchase_cents: None,
            max_discount_cents: Some(4_000),
            valid_from: now,
            valid_until: now + Duration::days(30),
            usage_limit: 10,
            applicable_events: None,
            coupon_type: CouponType::General,
        };
        assert!(validate_new_coupon(&coupon).is_ok());

        let over_100_pct = NewCoupon {
            discount_value: 10_001,
            ..coupon.clone()
        };
        assert!(validate_new_coupon(&over_100_pct).is_err());

        let backwards = NewCoupon {
            valid_until: now - Duration::days(1),
            ..coupon.clone()
        };
        assert!(validate_new_coupon(&backwards).is_err());

        let bad_code = NewCoupon {
            code: "NO SPACES".to_string(),
            ..coupon
        };
        assert!(validate_new_coupon(&bad_code).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  tech ").unwrap(), "tech");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }
}
