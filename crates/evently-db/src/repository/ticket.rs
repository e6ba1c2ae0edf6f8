//! # Ticket Repository
//!
//! Reads and status changes for issued tickets. Tickets are created by the
//! checkout (see [`crate::repository::checkout`]), never directly.
//!
//! ## Status Changes
//! ```text
//! UPDATE tickets SET status = 'used' WHERE id = ?1 AND status = 'active'
//!      │
//!   RETURNING <ticket columns>
//!      │
//!      ├── 1 row  → done
//!      └── 0 rows → load ticket
//!                     ├── missing → NotFound
//!                     ├── used / cancelled → InvalidTicketTransition
//!                     └── still active → TransactionFailed
//! ```

use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use evently_core::ticket::{transition, TicketAction};
use evently_core::{Ticket, TicketStatus};

pub(crate) const TICKET_COLUMNS: &str = r#"
    id, event_id, user_id, ticket_type, price_cents, status, qr_payload,
    first_name, last_name, email, phone, transaction_id, purchased_at
"#;

/// Repository for ticket database operations.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ticket>> {
        fetch_ticket(&self.pool, id).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Ticket> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Ticket", id))
    }

    /// A user's tickets, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = ?1 ORDER BY purchased_at DESC"
        );
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    /// Tickets issued for one event, oldest first.
    pub async fn list_by_event(&self, event_id: &str) -> DbResult<Vec<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = ?1 ORDER BY purchased_at"
        );
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    pub async fn list_all(&self) -> DbResult<Vec<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY purchased_at");
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    /// Marks an active ticket as used.
    pub async fn check_in(&self, id: &str) -> DbResult<Ticket> {
        self.apply(id, TicketAction::CheckIn, TicketStatus::Used).await
    }

    /// Cancels an active ticket. The event's attendee count is left alone.
    pub async fn cancel(&self, id: &str) -> DbResult<Ticket> {
        self.apply(id, TicketAction::Cancel, TicketStatus::Cancelled)
            .await
    }

    async fn apply(&self, id: &str, action: TicketAction, to: TicketStatus) -> DbResult<Ticket> {
        debug!(id = %id, ?action, "Changing ticket status");

        let sql = format!(
            "UPDATE tickets SET status = ?2 WHERE id = ?1 AND status = 'active' \
             RETURNING {TICKET_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(ticket) = updated {
            info!(id = %id, status = %ticket.status, "Ticket status changed");
            return Ok(ticket);
        }

        let ticket = self.get(id).await?;
        warn!(id = %id, status = %ticket.status, "Ticket status change rejected");
        Err(unchanged(id, ticket.status, action))
    }
}

/// Why a conditional status update touched no row.
fn unchanged(id: &str, current: TicketStatus, action: TicketAction) -> DbError {
    match transition(id, current, action) {
        Err(err) => DbError::from(err),
        // Still active: the row changed under the update and was not written.
        Ok(_) => DbError::TransactionFailed(format!(
            "ticket {id} was modified concurrently, {} not applied",
            action.verb()
        )),
    }
}

pub(crate) async fn fetch_ticket<'e, E>(executor: E, id: &str) -> DbResult<Option<Ticket>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1");
    let ticket = sqlx::query_as::<Sqlite, Ticket>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(ticket)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::checkout::ReserveRequest;
    use crate::{Database, DbConfig};
    use evently_core::{AttendeeInfo, CoreError, NewEvent};

    async fn issued_ticket(db: &Database) -> Ticket {
        let event = db
            .events()
            .create(
                &NewEvent {
                    title: "Show".to_string(),
                    description: "An evening show".to_string(),
                    category: "Music".to_string(),
                    date: "April 5, 2024".to_string(),
                    time: "6:00 PM".to_string(),
                    location: "Austin, TX".to_string(),
                    price_cents: Some(4_500),
                    ..Default::default()
                },
                "Festival Productions",
                None,
            )
            .await
            .unwrap();

        let reserved = db
            .checkout()
            .reserve(&ReserveRequest {
                event_id: event.id.clone(),
                user_id: "user-1".to_string(),
                coupon_code: None,
            })
            .await
            .unwrap();

        let attendee = AttendeeInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        };

        db.checkout()
            .commit(&reserved.reservation.id, &attendee, Some("txn_1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_lists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ticket = issued_ticket(&db).await;

        assert_eq!(db.tickets().list_by_user("user-1").await.unwrap(), vec![ticket.clone()]);
        assert_eq!(db.tickets().list_by_event(&ticket.event_id).await.unwrap().len(), 1);
        assert!(db.tickets().list_by_user("someone-else").await.unwrap().is_empty());
        assert_eq!(db.tickets().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_check_in_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ticket = issued_ticket(&db).await;

        let used = db.tickets().check_in(&ticket.id).await.unwrap();
        assert_eq!(used.status, TicketStatus::Used);

        let err = db.tickets().check_in(&ticket.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTicketTransition { current: TicketStatus::Used, .. })
        ));

        let err = db.tickets().cancel(&ticket.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTicketTransition { .. })));
    }

    #[tokio::test]
    async fn test_cancel_keeps_attendee_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ticket = issued_ticket(&db).await;

        let cancelled = db.tickets().cancel(&ticket.id).await.unwrap();
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
        assert_eq!(db.events().get(&ticket.event_id).await.unwrap().attendees, 1);

        let err = db.tickets().check_in(&ticket.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTicketTransition {
                current: TicketStatus::Cancelled,
                ..
            })
        ));
    }

    #[test]
    fn test_unchanged_active_ticket_is_an_error() {
        let err = unchanged("TKT-1", TicketStatus::Active, TicketAction::CheckIn);
        assert!(matches!(err, DbError::TransactionFailed(_)));

        let err = unchanged("TKT-1", TicketStatus::Used, TicketAction::Cancel);
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTicketTransition { current: TicketStatus::Used, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.tickets().check_in("TKT-0-missing").await.unwrap_err().is_not_found());
        assert!(db.tickets().get_by_id("TKT-0-missing").await.unwrap().is_none());
    }
}
