//! # Checkout Repository
//!
//! Transactional purchase flow: hold a seat (and a coupon use), then either
//! issue the ticket or give everything back.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Lifecycle                               │
//! │                                                                         │
//! │  reserve()  ── one transaction ──────────────────────────────────────┐ │
//! │  │  1. events.attendees + 1     WHERE attendees < max_attendees      │ │
//! │  │  2. evaluate coupon (optional)                                    │ │
//! │  │  3. coupons.used_count + 1   WHERE used_count < usage_limit       │ │
//! │  │  4. INSERT reservation (pending)                                  │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │       │                                                                 │
//! │       │   caller charges the payment                                    │
//! │       ▼                                                                 │
//! │  ┌─────────────┐  paid      ┌──────────────────────────────────────┐  │
//! │  │   outcome   │──────────► │ commit(): ticket + usage record      │  │
//! │  └─────────────┘            └──────────────────────────────────────┘  │
//! │       │ declined                                                        │
//! │       ▼                                                                 │
//! │  release(): attendees - 1, used_count - 1, status = released           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement of `reserve` is a write, so the transaction holds
//! SQLite's write lock before it reads anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::coupon::fetch_by_code;
use super::event::{fetch_event, give_back_seat, take_seat};
use crate::error::{DbError, DbResult};
use evently_core::coupon::{self, AppliedDiscount, CouponRejection};
use evently_core::ticket::{generate_ticket_id, TicketPayload};
use evently_core::{
    AttendeeInfo, CoreError, CouponType, Event, Reservation, ReservationStatus, Ticket,
    TicketStatus, TicketType,
};

const RESERVATION_COLUMNS: &str = r#"
    id, event_id, user_id, coupon_id, amount_cents, discount_cents, status,
    created_at, updated_at
"#;

/// Input for [`CheckoutRepository::reserve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub event_id: String,
    pub user_id: String,
    pub coupon_code: Option<String>,
}

/// A pending hold plus what the caller needs to charge for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservedCheckout {
    pub reservation: Reservation,
    /// Event as it stands after the seat was taken.
    pub event: Event,
    pub applied: Option<AppliedDiscount>,
}

/// Repository for the reserve / commit / release sequence.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
}

impl CheckoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutRepository { pool }
    }

    /// Takes a seat and, if a code is given, one coupon use.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown event
    /// - `Domain(EventFull)` at capacity
    /// - `Domain(CouponRejected(_))` for any coupon failure, including a
    ///   concurrent checkout taking the last use
    ///
    /// Nothing is held when an error is returned.
    pub async fn reserve(&self, request: &ReserveRequest) -> DbResult<ReservedCheckout> {
        debug!(
            event_id = %request.event_id,
            user_id = %request.user_id,
            coupon = ?request.coupon_code,
            "Reserving seat"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        take_seat(&mut tx, &request.event_id).await?;

        let event = fetch_event(&mut *tx, &request.event_id)
            .await?
            .ok_or_else(|| DbError::not_found("Event", &request.event_id))?;

        let code = request
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let applied = match code {
            Some(code) => Some(redeem_use(&mut tx, code, &event, now).await?),
            None => None,
        };

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            event_id: event.id.clone(),
            user_id: request.user_id.clone(),
            coupon_id: applied.as_ref().map(|a| a.coupon_id.clone()),
            amount_cents: event.price_cents,
            discount_cents: applied.as_ref().map(|a| a.discount.cents()).unwrap_or(0),
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, event_id, user_id, coupon_id, amount_cents, discount_cents,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.event_id)
        .bind(&reservation.user_id)
        .bind(&reservation.coupon_id)
        .bind(reservation.amount_cents)
        .bind(reservation.discount_cents)
        .bind(reservation.status)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            event_id = %event.id,
            attendees = event.attendees,
            net = %reservation.net(),
            "Seat reserved"
        );

        Ok(ReservedCheckout {
            reservation,
            event,
            applied,
        })
    }

    /// Turns a pending reservation into a ticket.
    ///
    /// Writes the ticket and, for discounted purchases, the coupon usage
    /// record in one transaction.
    pub async fn commit(
        &self,
        reservation_id: &str,
        attendee: &AttendeeInfo,
        transaction_id: Option<&str>,
    ) -> DbResult<Ticket> {
        debug!(reservation_id = %reservation_id, "Committing reservation");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let reservation =
            settle(&mut tx, reservation_id, ReservationStatus::Committed, now).await?;

        let ticket_type = match &reservation.coupon_id {
            Some(coupon_id) => {
                let coupon_type: Option<CouponType> =
                    sqlx::query_scalar("SELECT coupon_type FROM coupons WHERE id = ?1")
                        .bind(coupon_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                coupon_type.map(|t| t.ticket_type()).unwrap_or(TicketType::General)
            }
            None => TicketType::General,
        };

        let ticket_id = generate_ticket_id(now);
        let payload = TicketPayload {
            ticket_id: ticket_id.clone(),
            event_id: reservation.event_id.clone(),
            user_id: reservation.user_id.clone(),
            attendee_name: attendee.full_name(),
        };

        let ticket = Ticket {
            id: ticket_id,
            event_id: reservation.event_id.clone(),
            user_id: reservation.user_id.clone(),
            ticket_type,
            price_cents: reservation.net().cents(),
            status: TicketStatus::Active,
            qr_payload: payload.compose(),
            attendee: attendee.clone(),
            transaction_id: transaction_id.map(str::to_string),
            purchased_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, event_id, user_id, reservation_id, ticket_type, price_cents,
                status, qr_payload, first_name, last_name, email, phone,
                transaction_id, purchased_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&ticket.id)
        .bind(&ticket.event_id)
        .bind(&ticket.user_id)
        .bind(&reservation.id)
        .bind(ticket.ticket_type)
        .bind(ticket.price_cents)
        .bind(ticket.status)
        .bind(&ticket.qr_payload)
        .bind(&ticket.attendee.first_name)
        .bind(&ticket.attendee.last_name)
        .bind(&ticket.attendee.email)
        .bind(&ticket.attendee.phone)
        .bind(&ticket.transaction_id)
        .bind(ticket.purchased_at)
        .execute(&mut *tx)
        .await?;

        if let Some(coupon_id) = &reservation.coupon_id {
            sqlx::query(
                r#"
                INSERT INTO coupon_usages (id, coupon_id, user_id, event_id, discount_cents, used_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(coupon_id)
            .bind(&reservation.user_id)
            .bind(&reservation.event_id)
            .bind(reservation.discount_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            ticket_id = %ticket.id,
            reservation_id = %reservation.id,
            ticket_type = ?ticket.ticket_type,
            "Ticket issued"
        );
        Ok(ticket)
    }

    /// Gives the seat and coupon use back.
    pub async fn release(&self, reservation_id: &str) -> DbResult<Reservation> {
        debug!(reservation_id = %reservation_id, "Releasing reservation");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let reservation =
            settle(&mut tx, reservation_id, ReservationStatus::Released, now).await?;

        give_back_seat(&mut *tx, &reservation.event_id).await?;

        if let Some(coupon_id) = &reservation.coupon_id {
            sqlx::query(
                "UPDATE coupons SET used_count = used_count - 1 WHERE id = ?1 AND used_count > 0",
            )
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            event_id = %reservation.event_id,
            "Reservation released"
        );
        Ok(reservation)
    }

    /// Releases pending reservations created before `cutoff`.
    ///
    /// Returns how many were released. Used at startup to recover holds left
    /// behind by an interrupted checkout.
    pub async fn release_stale(&self, cutoff: DateTime<Utc>) -> DbResult<usize> {
        let stale: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM reservations WHERE status = 'pending' AND created_at < ?1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut released = 0;
        for id in stale {
            match self.release(&id).await {
                Ok(_) => released += 1,
                // Settled by someone else in the meantime.
                Err(DbError::Domain(CoreError::ReservationNotPending { .. })) => {}
                Err(err) => return Err(err),
            }
        }

        if released > 0 {
            warn!(released, "Released stale reservations");
        }
        Ok(released)
    }

    pub async fn get_reservation(&self, id: &str) -> DbResult<Option<Reservation>> {
        fetch_reservation(&self.pool, id).await
    }

    pub async fn list_pending(&self) -> DbResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE status = 'pending' ORDER BY created_at"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(reservations)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Evaluates the coupon against the event and takes one use.
async fn redeem_use(
    conn: &mut sqlx::SqliteConnection,
    code: &str,
    event: &Event,
    now: DateTime<Utc>,
) -> DbResult<AppliedDiscount> {
    let found = fetch_by_code(&mut *conn, code).await?;

    let applied = found
        .ok_or(CouponRejection::NotFound)
        .and_then(|c| coupon::evaluate(&c, &event.id, event.price(), now))
        .map_err(|rejection| {
            warn!(code = %code, event_id = %event.id, reason = %rejection, "Coupon rejected");
            CoreError::from(rejection)
        })?;

    let result = sqlx::query(
        r#"
        UPDATE coupons SET used_count = used_count + 1
        WHERE id = ?1 AND is_active = 1 AND used_count < usage_limit
        "#,
    )
    .bind(&applied.coupon_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        warn!(code = %code, "Coupon used up during checkout");
        return Err(CoreError::from(CouponRejection::UsageExhausted).into());
    }

    debug!(code = %applied.code, discount = %applied.discount, "Coupon use taken");
    Ok(applied)
}

/// Moves a pending reservation to `to`, or reports why it cannot.
async fn settle(
    conn: &mut sqlx::SqliteConnection,
    reservation_id: &str,
    to: ReservationStatus,
    now: DateTime<Utc>,
) -> DbResult<Reservation> {
    let result = sqlx::query(
        "UPDATE reservations SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = 'pending'",
    )
    .bind(reservation_id)
    .bind(to)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let reservation = fetch_reservation(&mut *conn, reservation_id)
        .await?
        .ok_or_else(|| DbError::not_found("Reservation", reservation_id))?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ReservationNotPending {
            reservation_id: reservation.id,
            status: reservation.status,
        }
        .into());
    }

    Ok(reservation)
}

async fn fetch_reservation<'e, E>(executor: E, id: &str) -> DbResult<Option<Reservation>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1");
    let reservation = sqlx::query_as::<Sqlite, Reservation>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(reservation)
}

// =============================================================================
// Unit Tests
// =============================================================================
