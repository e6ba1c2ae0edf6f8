//! # Fee Calculator
//!
//! Linear fee model with optional clamping.
//!
//! ```text
//! fee   = clamp(round(subtotal × rate) + flat, minimum, maximum)
//! total = subtotal + fee
//!
//! ┌────────────────┬────────┬────────┬─────────┬─────────┐
//! │ Schedule       │ rate   │ flat   │ minimum │ maximum │
//! ├────────────────┼────────┼────────┼─────────┼─────────┤
//! │ CARD           │ 2.9%   │ $0.30  │ -       │ -       │
//! │ BANK_TRANSFER  │ 0.5%   │ -      │ $1.50   │ $10.00  │
//! └────────────────┴────────┴────────┴─────────┴─────────┘
//! ```
//!
//! Pure and infallible for subtotals up to
//! [`MAX_PRICE_CENTS`](crate::validation::MAX_PRICE_CENTS), the largest price
//! validation accepts. Negative subtotals are treated as a zero fee base.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

/// A fee schedule. All parts are integer cents or basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeSchedule {
    pub rate: Rate,
    pub flat: Money,
    pub minimum: Option<Money>,
    pub maximum: Option<Money>,
}

/// Result of pricing a subtotal. `total == subtotal + fees`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeQuote {
    pub subtotal: Money,
    pub fees: Money,
    pub total: Money,
}

impl FeeSchedule {
    /// Card processing: 2.9% + $0.30.
    pub const CARD: FeeSchedule = FeeSchedule {
        rate: Rate::from_bps(290),
        flat: Money::from_cents(30),
        minimum: None,
        maximum: None,
    };

    /// Bank transfer: 0.5%, at least $1.50, at most $10.00.
    pub const BANK_TRANSFER: FeeSchedule = FeeSchedule {
        rate: Rate::from_bps(50),
        flat: Money::zero(),
        minimum: Some(Money::from_cents(150)),
        maximum: Some(Money::from_cents(1_000)),
    };

    /// Fee for a subtotal.
    pub fn fee(&self, subtotal: Money) -> Money {
        let base = subtotal.max(Money::zero());
        (base.percent_of(self.rate) + self.flat).clamp_between(self.minimum, self.maximum)
    }

    /// Prices a subtotal.
    ///
    /// ```rust
    /// use evently_core::fees::FeeSchedule;
    /// use evently_core::money::Money;
    ///
    /// let q = FeeSchedule::CARD.quote(Money::from_cents(29_900));
    /// assert_eq!(q.fees.cents(), 897); // 867 + 30
    /// assert_eq!(q.total.cents(), 30_797);
    /// ```
    pub fn quote(&self, subtotal: Money) -> FeeQuote {
        let fees = self.fee(subtotal);
        FeeQuote {
            subtotal,
            fees,
            total: subtotal + fees,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate_price_cents, MAX_PRICE_CENTS};

    #[test]
    fn test_largest_valid_price_quotes_cleanly() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        let subtotal = Money::from_cents(MAX_PRICE_CENTS);

        // 2.9% of $1,000,000 = $29,000, plus $0.30
        let card = FeeSchedule::CARD.quote(subtotal);
        assert_eq!(card.fees.cents(), 2_900_030);
        assert_eq!(card.total.cents(), MAX_PRICE_CENTS + 2_900_030);

        let bank = FeeSchedule::BANK_TRANSFER.quote(subtotal);
        assert_eq!(bank.fees.cents(), 1_000);
        assert_eq!(bank.total.cents(), MAX_PRICE_CENTS + 1_000);
    }

    #[test]
    fn test_bank_fee_floor_on_100_dollars() {
        let q = FeeSchedule::BANK_TRANSFER.quote(Money::from_dollars(100));
        assert_eq!(q.fees, Money::from_cents(150));
        assert_eq!(q.total, Money::from_cents(10_150));
    }

    #[test]
    fn test_bank_fee_between_bounds() {
        // 0.5% of $450 = $2.25
        let q = FeeSchedule::BANK_TRANSFER.quote(Money::from_dollars(450));
        assert_eq!(q.fees.cents(), 225);
    }

    #[test]
    fn test_bank_fee_ceiling() {
        let q = FeeSchedule::BANK_TRANSFER.quote(Money::from_dollars(5_000));
        assert_eq!(q.fees, Money::from_dollars(10));
    }

    #[test]
    fn test_card_fee() {
        assert_eq!(FeeSchedule::CARD.fee(Money::zero()).cents(), 30);
        // $150 × 2.9% = $4.35, + $0.30
        assert_eq!(FeeSchedule::CARD.fee(Money::from_dollars(150)).cents(), 465);
    }

    #[test]
    fn test_negative_subtotal_uses_zero_base() {
        let q = FeeSchedule::CARD.quote(Money::from_cents(-500));
        assert_eq!(q.fees.cents(), 30);
        assert_eq!(q.total, q.subtotal + q.fees);

        let q = FeeSchedule::BANK_TRANSFER.quote(Money::from_cents(-500));
        assert_eq!(q.fees.cents(), 150);
    }

    #[test]
    fn test_total_is_subtotal_plus_fees_and_bank_fee_stays_clamped() {
        let mut cents = 0i64;
        while cents < 1_000_000 {
            let subtotal = Money::from_cents(cents);
            for schedule in [FeeSchedule::CARD, FeeSchedule::BANK_TRANSFER] {
                let q = schedule.quote(subtotal);
                assert_eq!(q.total, q.subtotal + q.fees);
            }
            let bank = FeeSchedule::BANK_TRANSFER.fee(subtotal);
            assert!(bank >= Money::from_cents(150) && bank <= Money::from_cents(1_000));
            cents = cents * 3 + 7;
        }
    }
}
