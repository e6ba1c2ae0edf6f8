//! # Ticket Identity
//!
//! Ticket and transaction ids, QR payload composition, and ticket status
//! transitions.
//!
//! ## Id Shape
//! ```text
//! TKT-1718000000000-k3j9x0a7q
//! │   │             │
//! │   │             └── 9 random base36 chars (from a v4 UUID)
//! │   └──────────────── unix millis at generation
//! └──────────────────── prefix (TKT- ticket, txn_ card, BT- bank transfer)
//! ```
//!
//! Ids are unique only probabilistically: two ids minted in the same
//! millisecond collide with probability 36^-9.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::TicketStatus;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Separator between payload fields.
pub const PAYLOAD_SEPARATOR: char = '|';

/// Leading tag of every QR payload.
pub const PAYLOAD_TAG: &str = "EVENTLY";

// =============================================================================
// Id Generation
// =============================================================================

/// Nine random base36 characters.
pub fn random_suffix() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        out.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}

/// `TKT-<millis>-<suffix>`.
pub fn generate_ticket_id(now: DateTime<Utc>) -> String {
    format!("TKT-{}-{}", now.timestamp_millis(), random_suffix())
}

/// `txn_<millis>_<suffix>` for card payments.
pub fn generate_card_transaction_id(now: DateTime<Utc>) -> String {
    format!("txn_{}_{}", now.timestamp_millis(), random_suffix())
}

/// `BT-<millis>-<suffix>` for bank transfers.
pub fn generate_bank_transfer_id(now: DateTime<Utc>) -> String {
    format!("BT-{}-{}", now.timestamp_millis(), random_suffix())
}

// =============================================================================
// QR Payload
// =============================================================================

/// Fields that identify a ticket on its QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TicketPayload {
    pub ticket_id: String,
    pub event_id: String,
    pub user_id: String,
    pub attendee_name: String,
}

impl TicketPayload {
    /// Single string stored on the ticket and hashed into the QR pattern.
    ///
    /// Separators inside fields are replaced so the field count is fixed.
    ///
    /// ```rust
    /// use evently_core::ticket::TicketPayload;
    ///
    /// let payload = TicketPayload {
    ///     ticket_id: "TKT-1-abc".into(),
    ///     event_id: "evt".into(),
    ///     user_id: "usr".into(),
    ///     attendee_name: "Ada Lovelace".into(),
    /// };
    /// assert_eq!(payload.compose(), "EVENTLY|TKT-1-abc|evt|usr|Ada Lovelace");
    /// ```
    pub fn compose(&self) -> String {
        let sep = PAYLOAD_SEPARATOR;
        format!(
            "{PAYLOAD_TAG}{sep}{}{sep}{}{sep}{}{sep}{}",
            clean(&self.ticket_id),
            clean(&self.event_id),
            clean(&self.user_id),
            clean(&self.attendee_name),
        )
    }
}

fn clean(field: &str) -> String {
    field.trim().replace(PAYLOAD_SEPARATOR, "/")
}

// =============================================================================
// Status Transitions
// =============================================================================

/// Something that can happen to a ticket after purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    CheckIn,
    Cancel,
}

impl TicketAction {
    pub fn verb(&self) -> &'static str {
        match self {
            TicketAction::CheckIn => "check in",
            TicketAction::Cancel => "cancel",
        }
    }
}

/// Status after applying `action`, or why it cannot happen.
///
/// Only active tickets move. Used and cancelled tickets are terminal.
pub fn transition(
    ticket_id: &str,
    current: TicketStatus,
    action: TicketAction,
) -> CoreResult<TicketStatus> {
    match (current, action) {
        (TicketStatus::Active, TicketAction::CheckIn) => Ok(TicketStatus::Used),
        (TicketStatus::Active, TicketAction::Cancel) => Ok(TicketStatus::Cancelled),
        (current, action) => Err(CoreError::InvalidTicketTransition {
            ticket_id: ticket_id.to_string(),
            current,
            action: action.verb(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ticket_id_shape() {
        let now = Utc::now();
        let id = generate_ticket_id(now);
        let parts: Vec<&str> = id.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TKT");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_transaction_id_prefixes() {
        let now = Utc::now();
        assert!(generate_card_transaction_id(now).starts_with("txn_"));
        assert!(generate_bank_transfer_id(now).starts_with("BT-"));
    }

    #[test]
    fn test_ids_differ_within_same_millisecond() {
        let now = Utc::now();
        let ids: HashSet<String> = (0..1_000).map(|_| generate_ticket_id(now)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_payload_escapes_separator() {
        let payload = TicketPayload {
            ticket_id: "TKT-1-a".to_string(),
            event_id: "e".to_string(),
            user_id: "u".to_string(),
            attendee_name: "A|B".to_string(),
        };
        let composed = payload.compose();
        assert_eq!(composed.matches(PAYLOAD_SEPARATOR).count(), 4);
        assert!(composed.ends_with("A/B"));
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            transition("t", TicketStatus::Active, TicketAction::CheckIn).unwrap(),
            TicketStatus::Used
        );
        assert_eq!(
            transition("t", TicketStatus::Active, TicketAction::Cancel).unwrap(),
            TicketStatus::Cancelled
        );

        for (status, action) in [
            (TicketStatus::Used, TicketAction::CheckIn),
            (TicketStatus::Cancelled, TicketAction::CheckIn),
            (TicketStatus::Used, TicketAction::Cancel),
            (TicketStatus::Cancelled, TicketAction::Cancel),
        ] {
            let err = transition("t", status, action).unwrap_err();
            assert!(matches!(
                err,
                CoreError::InvalidTicketTransition { current, .. } if current == status
            ));
        }
    }
}
