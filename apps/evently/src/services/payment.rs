//! # Card Gateway
//!
//! Simulated card processor. Every charge waits for the configured delay,
//! then succeeds or is declined at random.
//!
//! ```text
//! charge($X) ──► validate amount ──► sleep(delay) ──► roll 0..10000
//!                                                        │
//!                          roll < decline_rate_bps ◄─────┴────► otherwise
//!                                   │                              │
//!                              CardDeclined               CardCharge { txn_… }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use evently_core::ticket::generate_card_transaction_id;
use evently_core::validation::validate_payment_amount;
use evently_core::{Money, Rate};

/// A successful card charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCharge {
    /// `txn_<millis>_<suffix>`
    pub transaction_id: String,
    pub amount: Money,
    pub charged_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CardGateway {
    decline_rate: Rate,
    delay: Duration,
}

impl CardGateway {
    pub fn new(decline_rate: Rate, delay: Duration) -> Self {
        CardGateway {
            decline_rate,
            delay,
        }
    }

    /// Gateway that never declines and never waits.
    pub fn always_approve() -> Self {
        CardGateway::new(Rate::zero(), Duration::ZERO)
    }

    /// Gateway that declines every charge.
    pub fn always_decline() -> Self {
        CardGateway::new(Rate::from_bps(10_000), Duration::ZERO)
    }

    pub fn decline_rate(&self) -> Rate {
        self.decline_rate
    }

    /// Charges the card.
    pub async fn charge(&self, amount: Money) -> ServiceResult<CardCharge> {
        validate_payment_amount(amount.cents())?;

        debug!(amount = %amount, "Processing card payment");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if roll_bps() < self.decline_rate.bps() {
            warn!(amount = %amount, "Card payment declined");
            return Err(ServiceError::CardDeclined);
        }

        let now = Utc::now();
        let charge = CardCharge {
            transaction_id: generate_card_transaction_id(now),
            amount,
            charged_at: now,
        };

        info!(transaction_id = %charge.transaction_id, amount = %amount, "Card payment approved");
        Ok(charge)
    }
}

/// Uniform draw in `0..10_000`.
fn roll_bps() -> u32 {
    (Uuid::new_v4().as_u128() % 10_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_approved_charge() {
        let gateway = CardGateway::always_approve();
        let charge = gateway.charge(Money::from_cents(10_320)).await.unwrap();
        assert!(charge.transaction_id.starts_with("txn_"));
        assert_eq!(charge.amount.cents(), 10_320);
    }

    #[tokio::test]
    async fn test_declined_charge() {
        let gateway = CardGateway::always_decline();
        let err = gateway.charge(Money::from_cents(500)).await.unwrap_err();
        assert_eq!(err, ServiceError::CardDeclined);
        assert_eq!(err.to_string(), "Payment declined. Please check your card details.");
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let gateway = CardGateway::always_approve();
        let err = gateway.charge(Money::zero()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_delay() {
        let gateway = CardGateway::new(Rate::zero(), Duration::from_millis(2_000));
        let start = tokio::time::Instant::now();
        gateway.charge(Money::from_cents(100)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }

    #[test]
    fn test_roll_range() {
        for _ in 0..1_000 {
            assert!(roll_bps() < 10_000);
        }
    }
}
