//! # Coupon Repository
//!
//! Storage for coupons and their usage history.
//!
//! ## Row Mapping
//! `applicable_events` is a JSON array in a TEXT column, so coupons are
//! read through [`CouponRow`] and converted. A value that does not parse is
//! reported as [`DbError::Corrupt`] rather than silently widening the coupon
//! to every event.
//!
//! ## Preview vs Redeem
//! [`CouponRepository::preview`] evaluates without consuming a use. Uses are
//! only consumed inside the checkout transaction.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use evently_core::coupon::{self, AppliedDiscount, CouponRejection};
use evently_core::validation::validate_new_coupon;
use evently_core::{Coupon, CouponType, CouponUsage, DiscountType, Money, NewCoupon};

const COUPON_COLUMNS: &str = r#"
    id, code, discount_type, discount_value, min_purchase_cents,
    max_discount_cents, valid_from, valid_until, usage_limit, used_count,
    is_active, applicable_events, coupon_type
"#;

/// Coupon as stored.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CouponRow {
    id: String,
    code: String,
    discount_type: DiscountType,
    discount_value: i64,
    min_purchase_cents: Option<i64>,
    max_discount_cents: Option<i64>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    usage_limit: i64,
    used_count: i64,
    is_active: bool,
    applicable_events: Option<String>,
    coupon_type: CouponType,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let applicable_events = match row.applicable_events {
            Some(json) => Some(serde_json::from_str::<Vec<String>>(&json).map_err(|err| {
                DbError::Corrupt {
                    entity: "Coupon".to_string(),
                    id: row.id.clone(),
                    reason: format!("applicable_events: {err}"),
                }
            })?),
            None => None,
        };

        Ok(Coupon {
            id: row.id,
            code: row.code,
            discount_type: row.discount_type,
            discount_value: row.discount_value,
            min_purchase_cents: row.min_purchase_cents,
            max_discount_cents: row.max_discount_cents,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            is_active: row.is_active,
            applicable_events,
            coupon_type: row.coupon_type,
        })
    }
}

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at, code");
        let rows = sqlx::query_as::<_, CouponRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Coupon::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?1");
        let row = sqlx::query_as::<_, CouponRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Case-insensitive lookup.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        fetch_by_code(&self.pool, code).await
    }

    /// Active VIP coupons.
    pub async fn list_vip(&self) -> DbResult<Vec<Coupon>> {
        let coupons = self.list().await?;
        Ok(coupon::vip_coupons(&coupons).into_iter().cloned().collect())
    }

    /// Validates and stores a new coupon with no uses.
    pub async fn create(&self, new: &NewCoupon) -> DbResult<Coupon> {
        validate_new_coupon(new)?;

        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: coupon::normalize_code(&new.code),
            discount_type: new.discount_type,
            discount_value: new.discount_value,
            min_purchase_cents: new.min_purchase_cents,
            max_discount_cents: new.max_discount_cents,
            valid_from: new.valid_from,
            valid_until: new.valid_until,
            usage_limit: new.usage_limit,
            used_count: 0,
            is_active: true,
            applicable_events: new.applicable_events.clone(),
            coupon_type: new.coupon_type,
        };

        self.insert(&coupon).await?;

        info!(code = %coupon.code, "Coupon created");
        Ok(coupon)
    }

    /// Stores a coupon as given, including its used count.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code, "Inserting coupon");

        let applicable_events = coupon
            .applicable_events
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| DbError::Internal(err.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, discount_value, min_purchase_cents,
                max_discount_cents, valid_from, valid_until, usage_limit, used_count,
                is_active, applicable_events, coupon_type, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.min_purchase_cents)
        .bind(coupon.max_discount_cents)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(coupon.is_active)
        .bind(applicable_events)
        .bind(coupon.coupon_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &coupon.code),
            other => other,
        })?;

        Ok(())
    }

    /// Evaluates a code without consuming a use.
    pub async fn preview(
        &self,
        code: &str,
        event_id: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> DbResult<AppliedDiscount> {
        debug!(code = %code, event_id = %event_id, amount = %amount, "Previewing coupon");

        let found = self.get_by_code(code).await?;
        let applied = found
            .ok_or(CouponRejection::NotFound)
            .and_then(|c| coupon::evaluate(&c, event_id, amount, now))
            .map_err(|rejection| {
                warn!(code = %code, reason = %rejection, "Coupon rejected");
                DbError::Domain(rejection.into())
            })?;

        Ok(applied)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        info!(id = %id, active, "Coupon activation changed");
        Ok(())
    }

    /// Usage records, newest first. `None` returns every coupon's history.
    pub async fn usage_history(&self, coupon_id: Option<&str>) -> DbResult<Vec<CouponUsage>> {
        let usages = sqlx::query_as::<_, CouponUsage>(
            r#"
            SELECT id, coupon_id, user_id, event_id, discount_cents, used_at
            FROM coupon_usages
            WHERE ?1 IS NULL OR coupon_id = ?1
            ORDER BY used_at DESC
            "#,
        )
        .bind(coupon_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(usages)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn fetch_by_code<'e, E>(executor: E, code: &str) -> DbResult<Option<Coupon>>
where
    E: SqliteExecutor<'e>,
{
    // `code` is COLLATE NOCASE
    let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1");
    let row = sqlx::query_as::<Sqlite, CouponRow>(&sql)
        .bind(code.trim())
        .fetch_optional(executor)
        .await?;

    row.map(Coupon::try_from).transpose()
}

// =============================================================================
// Unit Tests
// =============================================================================
