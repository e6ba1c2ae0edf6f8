//! # Coupon Commands

use chrono::Utc;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{AppState, Session};
use evently_core::{AppliedDiscount, Coupon, CouponUsage, NewCoupon};

/// Checks a code against an event's price without using it up.
pub async fn preview_coupon(
    state: &AppState,
    code: &str,
    event_id: &str,
) -> ApiResult<AppliedDiscount> {
    debug!(code = %code, event_id = %event_id, "preview_coupon command");

    let event = state.db.events().get(event_id).await?;
    let applied = state
        .db
        .coupons()
        .preview(code, &event.id, event.price(), Utc::now())
        .await?;

    Ok(applied)
}

/// Active VIP coupons.
pub async fn vip_coupons(state: &AppState) -> ApiResult<Vec<Coupon>> {
    debug!("vip_coupons command");
    Ok(state.db.coupons().list_vip().await?)
}

pub async fn list_coupons(state: &AppState, session: &Session) -> ApiResult<Vec<Coupon>> {
    session.require_organizer()?;
    debug!("list_coupons command");

    Ok(state.db.coupons().list().await?)
}

pub async fn create_coupon(
    state: &AppState,
    session: &Session,
    new: NewCoupon,
) -> ApiResult<Coupon> {
    let user = session.require_organizer()?;
    debug!(user_id = %user.id, code = %new.code, "create_coupon command");

    Ok(state.db.coupons().create(&new).await?)
}

pub async fn set_coupon_active(
    state: &AppState,
    session: &Session,
    id: &str,
    active: bool,
) -> ApiResult<()> {
    session.require_organizer()?;
    debug!(id = %id, active, "set_coupon_active command");

    state.db.coupons().set_active(id, active).await?;
    Ok(())
}

/// Usage records for one coupon, or all of them, newest first.
pub async fn usage_history(
    state: &AppState,
    session: &Session,
    coupon_id: Option<&str>,
) -> ApiResult<Vec<CouponUsage>> {
    session.require_organizer()?;
    debug!(coupon_id = ?coupon_id, "usage_history command");

    Ok(state.db.coupons().usage_history(coupon_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::error::ErrorCode;
    use chrono::Duration;
    use evently_core::{CouponType, DiscountType, Money};
    use evently_db::seed_demo_data;

    fn new_coupon(code: &str) -> NewCoupon {
        let now = Utc::now();
        NewCoupon {
            code: code.to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 1_000,
            min_purchase_cents: Some(2_000),
            max_discount_cents: None,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            usage_limit: 5,
            applicable_events: None,
            coupon_type: CouponType::General,
        }
    }

    #[tokio::test]
    async fn test_preview_does_not_consume() {
        let state = test_support::state().await;
        seed_demo_data(&state.db).await.unwrap();
        let organizer = test_support::organizer(&state).await;
        let event = test_support::event(&state, &organizer, 10, 40_000).await;

        let applied = preview_coupon(&state, "welcome20", &event.id).await.unwrap();
        assert_eq!(applied.discount, Money::from_cents(5_000));
        assert_eq!(applied.final_price, Money::from_cents(35_000));

        let coupon = state.db.coupons().get_by_code("WELCOME20").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 15);

        let err = preview_coupon(&state, "NOPE", &event.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponRejected);
        assert_eq!(err.message, "Coupon code not found");
    }

    #[tokio::test]
    async fn test_vip_list_and_create() {
        let state = test_support::state().await;
        seed_demo_data(&state.db).await.unwrap();

        let vip = vip_coupons(&state).await.unwrap();
        assert_eq!(vip.len(), 1);
        assert_eq!(vip[0].code, "VIP50");

        let attendee = test_support::attendee(&state).await;
        let err = create_coupon(&state, &attendee, new_coupon("SPRING10"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let organizer = test_support::organizer(&state).await;
        let coupon = create_coupon(&state, &organizer, new_coupon(" spring10 "))
            .await
            .unwrap();
        assert_eq!(coupon.code, "SPRING10");
        assert_eq!(coupon.used_count, 0);

        let err = create_coupon(&state, &organizer, new_coupon("Spring10"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        set_coupon_active(&state, &organizer, &coupon.id, false).await.unwrap();
        assert_eq!(list_coupons(&state, &organizer).await.unwrap().len(), 4);
        assert!(usage_history(&state, &organizer, Some(&coupon.id))
            .await
            .unwrap()
            .is_empty());
    }
}
