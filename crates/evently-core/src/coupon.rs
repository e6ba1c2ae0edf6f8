//! # Coupon Evaluator
//!
//! Validates a coupon against an event and an amount, then computes the
//! discount.
//!
//! ## Check Order
//! ```text
//! code ──► find_by_code ──► None ─────────────────────► NotFound
//!                │
//!                ▼
//!           is_active? ──── no ───────────────────────► Inactive
//!                │
//!                ▼
//!     valid_from <= now <= valid_until? ── no ────────► OutsideValidityWindow
//!                │
//!                ▼
//!     used_count < usage_limit? ── no ────────────────► UsageExhausted
//!                │
//!                ▼
//!     event in applicable_events? ── no ──────────────► NotApplicable
//!                │
//!                ▼
//!     amount >= min_purchase? ── no ──────────────────► BelowMinimumPurchase
//!                │
//!                ▼
//!          compute discount
//! ```
//! First failure wins.
//!
//! ## Discount
//! - percentage: `amount × bps / 10000` (half-up), then capped by `max_discount`
//! - fixed: the fixed value
//! - always capped at `amount`, so the final price never goes negative
//!
//! Evaluation never consumes a use. The checkout transaction in evently-db
//! re-runs [`evaluate`] and increments the counter atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Coupon, CouponType, DiscountType};

// =============================================================================
// Rejection Reasons
// =============================================================================

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CouponRejection {
    #[error("Coupon code not found")]
    NotFound,

    #[error("Coupon is not active")]
    Inactive,

    #[error("Coupon has expired or is not yet valid")]
    OutsideValidityWindow,

    #[error("Coupon usage limit reached")]
    UsageExhausted,

    #[error("Coupon is not applicable for this event")]
    NotApplicable,

    #[error("Minimum purchase amount is {}", as_money(.minimum_cents))]
    BelowMinimumPurchase { minimum_cents: i64 },
}

fn as_money(cents: &i64) -> Money {
    Money::from_cents(*cents)
}

// =============================================================================
// Applied Discount
// =============================================================================

/// Outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub coupon_id: String,
    pub code: String,
    pub coupon_type: CouponType,
    pub amount: Money,
    pub discount: Money,
    pub final_price: Money,
}

// =============================================================================
// Evaluation
// =============================================================================

/// Canonical form of a code for comparisons.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Case-insensitive lookup over a slice of coupons.
pub fn find_by_code<'a>(coupons: &'a [Coupon], code: &str) -> Option<&'a Coupon> {
    let wanted = normalize_code(code);
    coupons.iter().find(|c| normalize_code(&c.code) == wanted)
}

/// Active coupons of the VIP type.
pub fn vip_coupons(coupons: &[Coupon]) -> Vec<&Coupon> {
    coupons
        .iter()
        .filter(|c| c.is_active && c.coupon_type == CouponType::Vip)
        .collect()
}

/// Looks a code up and evaluates it.
///
/// ## Example
/// ```rust,ignore
/// let applied = coupon::evaluate_code(&coupons, "welcome20", &event.id, event.price(), Utc::now())?;
/// ```
pub fn evaluate_code(
    coupons: &[Coupon],
    code: &str,
    event_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> Result<AppliedDiscount, CouponRejection> {
    let coupon = find_by_code(coupons, code).ok_or(CouponRejection::NotFound)?;
    evaluate(coupon, event_id, amount, now)
}

/// Runs every check on a found coupon and computes the discount.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use evently_core::coupon::evaluate;
/// use evently_core::money::Money;
/// use evently_core::types::{Coupon, CouponType, DiscountType};
///
/// let now = Utc::now();
/// let welcome20 = Coupon {
///     id: "c1".into(),
///     code: "WELCOME20".into(),
///     discount_type: DiscountType::Percentage,
///     discount_value: 2_000,
///     min_purchase_cents: None,
///     max_discount_cents: Some(5_000),
///     valid_from: now - Duration::days(1),
///     valid_until: now + Duration::days(1),
///     usage_limit: 100,
///     used_count: 15,
///     is_active: true,
///     applicable_events: None,
///     coupon_type: CouponType::General,
/// };
///
/// // 20% of $400 is $80, capped at $50
/// let applied = evaluate(&welcome20, "evt-1", Money::from_cents(40_000), now).unwrap();
/// assert_eq!(applied.discount.cents(), 5_000);
/// assert_eq!(applied.final_price.cents(), 35_000);
/// ```
pub fn evaluate(
    coupon: &Coupon,
    event_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> Result<AppliedDiscount, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }

    if !coupon.is_within_window(now) {
        return Err(CouponRejection::OutsideValidityWindow);
    }

    if coupon.used_count >= coupon.usage_limit {
        return Err(CouponRejection::UsageExhausted);
    }

    if !coupon.applies_to(event_id) {
        return Err(CouponRejection::NotApplicable);
    }

    if let Some(minimum_cents) = coupon.min_purchase_cents {
        if amount.cents() < minimum_cents {
            return Err(CouponRejection::BelowMinimumPurchase { minimum_cents });
        }
    }

    let discount = compute_discount(coupon, amount);

    Ok(AppliedDiscount {
        coupon_id: coupon.id.clone(),
        code: coupon.code.clone(),
        coupon_type: coupon.coupon_type,
        amount,
        discount,
        final_price: amount - discount,
    })
}

/// Discount for an amount, ignoring eligibility.
///
/// Never negative, never above `amount`.
pub fn compute_discount(coupon: &Coupon, amount: Money) -> Money {
    let base = amount.max(Money::zero());

    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            let pct = base.percent_of(coupon.rate());
            match coupon.max_discount_cents {
                Some(cap) => pct.min(Money::from_cents(cap)),
                None => pct,
            }
        }
        DiscountType::Fixed => Money::from_cents(coupon.discount_value),
    };

    raw.max(Money::zero()).min(base)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(code: &str, discount_type: DiscountType, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: format!("id-{code}"),
            code: code.to_string(),
            discount_type,
            discount_value: value,
            min_purchase_cents: None,
            max_discount_cents: None,
            valid_from: now - Duration::days(30),
            valid_until: now + Duration::days(30),
            usage_limit: 100,
            used_count: 0,
            is_active: true,
            applicable_events: None,
            coupon_type: CouponType::General,
        }
    }

    fn welcome20() -> Coupon {
        Coupon {
            max_discount_cents: Some(5_000),
            used_count: 15,
            ..coupon("WELCOME20", DiscountType::Percentage, 2_000)
        }
    }

    fn vip50() -> Coupon {
        Coupon {
            min_purchase_cents: Some(10_000),
            usage_limit: 50,
            used_count: 8,
            coupon_type: CouponType::Vip,
            ..coupon("VIP50", DiscountType::Fixed, 5_000)
        }
    }

    #[test]
    fn test_welcome20_is_capped_at_max_discount() {
        let applied = evaluate(&welcome20(), "evt", Money::from_dollars(400), Utc::now()).unwrap();
        assert_eq!(applied.discount, Money::from_dollars(50));
        assert_eq!(applied.final_price, Money::from_dollars(350));
    }

    #[test]
    fn test_percentage_below_cap() {
        let applied = evaluate(&welcome20(), "evt", Money::from_dollars(150), Utc::now()).unwrap();
        assert_eq!(applied.discount, Money::from_dollars(30));
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of $0.10 = 1.5 cents → 2
        let c = coupon("ODD", DiscountType::Percentage, 1_500);
        assert_eq!(compute_discount(&c, Money::from_cents(10)).cents(), 2);
    }

    #[test]
    fn test_fixed_discount_never_exceeds_amount() {
        let c = coupon("BIG", DiscountType::Fixed, 10_000);
        let applied = evaluate(&c, "evt", Money::from_cents(2_500), Utc::now()).unwrap();
        assert_eq!(applied.discount.cents(), 2_500);
        assert!(applied.final_price.is_zero());
    }

    #[test]
    fn test_discount_bounds_hold_across_amounts() {
        let coupons = [
            welcome20(),
            coupon("PCT90", DiscountType::Percentage, 9_000),
            coupon("FIX", DiscountType::Fixed, 7_500),
        ];
        for c in &coupons {
            for cents in [0, 1, 99, 1_000, 24_999, 40_000, 1_000_000] {
                let amount = Money::from_cents(cents);
                let d = compute_discount(c, amount);
                assert!(d <= amount, "{} on {}", c.code, amount);
                assert!(!d.is_negative());
                if let Some(cap) = c.max_discount_cents {
                    assert!(d.cents() <= cap);
                }
            }
        }
    }

    #[test]
    fn test_rejection_order() {
        let now = Utc::now();

        // Inactive beats every later check
        let c = Coupon {
            is_active: false,
            used_count: 100,
            valid_until: now - Duration::days(1),
            ..welcome20()
        };
        assert_eq!(evaluate(&c, "evt", Money::zero(), now), Err(CouponRejection::Inactive));

        // Window beats usage
        let c = Coupon {
            valid_from: now + Duration::days(1),
            used_count: 100,
            ..welcome20()
        };
        assert_eq!(
            evaluate(&c, "evt", Money::zero(), now),
            Err(CouponRejection::OutsideValidityWindow)
        );

        // Usage beats applicability
        let c = Coupon {
            used_count: 100,
            applicable_events: Some(vec!["other".to_string()]),
            ..welcome20()
        };
        assert_eq!(evaluate(&c, "evt", Money::zero(), now), Err(CouponRejection::UsageExhausted));

        // Applicability beats minimum purchase
        let c = Coupon {
            applicable_events: Some(vec!["other".to_string()]),
            ..vip50()
        };
        assert_eq!(
            evaluate(&c, "evt", Money::from_cents(1), now),
            Err(CouponRejection::NotApplicable)
        );

        assert_eq!(
            evaluate(&vip50(), "evt", Money::from_dollars(99), now),
            Err(CouponRejection::BelowMinimumPurchase { minimum_cents: 10_000 })
        );
    }

    #[test]
    fn test_usage_limit_rejects_next_attempt() {
        let mut c = Coupon {
            usage_limit: 3,
            ..coupon("THREE", DiscountType::Fixed, 100)
        };
        for _ in 0..3 {
            assert!(evaluate(&c, "evt", Money::from_dollars(10), Utc::now()).is_ok());
            c.used_count += 1;
        }
        assert_eq!(
            evaluate(&c, "evt", Money::from_dollars(10), Utc::now()),
            Err(CouponRejection::UsageExhausted)
        );
    }

    #[test]
    fn test_find_by_code_is_case_insensitive() {
        let coupons = vec![welcome20(), vip50()];
        assert_eq!(
            find_by_code(&coupons, "welcome20").map(|c| c.id.as_str()),
            Some("id-WELCOME20")
        );
        assert_eq!(find_by_code(&coupons, " Vip50 ").map(|c| c.id.as_str()), Some("id-VIP50"));
        assert!(find_by_code(&coupons, "NOPE").is_none());

        assert_eq!(
            evaluate_code(&coupons, "nope", "evt", Money::zero(), Utc::now()),
            Err(CouponRejection::NotFound)
        );
    }

    #[test]
    fn test_vip_coupons_excludes_inactive() {
        let inactive_vip = Coupon {
            is_active: false,
            ..vip50()
        };
        let coupons = vec![welcome20(), vip50(), inactive_vip];
        let vip = vip_coupons(&coupons);
        assert_eq!(vip.len(), 1);
        assert_eq!(vip[0].code, "VIP50");
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(CouponRejection::NotFound.to_string(), "Coupon code not found");
        assert_eq!(
            CouponRejection::BelowMinimumPurchase { minimum_cents: 10_000 }.to_string(),
            "Minimum purchase amount is $100.00"
        );
    }
}
