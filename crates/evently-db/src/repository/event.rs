//! # Event Repository
//!
//! Database operations for events.
//!
//! ## Capacity Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Registration is ONE conditional statement, never read-modify-write:   │
//! │                                                                         │
//! │    UPDATE events SET attendees = attendees + 1                         │
//! │    WHERE id = ?1 AND attendees < max_attendees                         │
//! │                                                                         │
//! │  rows_affected = 1  → seat taken                                       │
//! │  rows_affected = 0  → event missing (NotFound) or full (EventFull)     │
//! │                                                                         │
//! │  Two writers racing for the last seat: SQLite serializes the writes,   │
//! │  the second one sees attendees == max_attendees and matches 0 rows.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use evently_core::validation::{validate_event_update, validate_new_event};
use evently_core::{
    CoreError, Event, EventFilter, EventUpdate, NewEvent, DEFAULT_EVENT_IMAGE,
    DEFAULT_MAX_ATTENDEES,
};

pub(crate) const EVENT_COLUMNS: &str = r#"
    id, title, description, category, date, time, location, image_url,
    organizer, organizer_id, max_attendees, attendees, price_cents,
    created_at, updated_at
"#;

/// Repository for event database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = EventRepository::new(pool);
///
/// let event = repo.create(&new_event, "Ada Lovelace", Some(&user.id)).await?;
/// let event = repo.register_attendee(&event.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    /// All events, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at, title");
        let events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Events created by one organizer.
    pub async fn list_by_organizer(&self, organizer_id: &str) -> DbResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = ?1 ORDER BY created_at, title"
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(organizer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Filters events by free text, category and location.
    ///
    /// ## Matching
    /// - `text`: substring of title, description or location
    /// - `category`: whole category
    /// - `location`: substring of location
    ///
    /// All comparisons are case-insensitive. Unset filters match everything.
    pub async fn search(&self, filter: &EventFilter) -> DbResult<Vec<Event>> {
        let text = non_empty(&filter.text).map(like_pattern);
        let category = non_empty(&filter.category).map(str::to_string);
        let location = non_empty(&filter.location).map(like_pattern);

        debug!(text = ?text, category = ?category, location = ?location, "Searching events");

        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE (?1 IS NULL
                   OR title LIKE ?1 ESCAPE '\'
                   OR description LIKE ?1 ESCAPE '\'
                   OR location LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category = ?2 COLLATE NOCASE)
              AND (?3 IS NULL OR location LIKE ?3 ESCAPE '\')
            ORDER BY created_at, title
            "#
        );

        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(text)
            .bind(category)
            .bind(location)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = events.len(), "Search returned events");
        Ok(events)
    }

    /// Gets an event by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Event))` - Event found
    /// * `Ok(None)` - Event not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Event>> {
        fetch_event(&self.pool, id).await
    }

    /// Like [`get_by_id`](Self::get_by_id) but missing is an error.
    pub async fn get(&self, id: &str) -> DbResult<Event> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Event", id))
    }

    /// Creates an event, filling defaults for capacity, price and image.
    pub async fn create(
        &self,
        new: &NewEvent,
        organizer: &str,
        organizer_id: Option<&str>,
    ) -> DbResult<Event> {
        validate_new_event(new)?;

        let now = Utc::now();
        let image_url = new
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_EVENT_IMAGE);

        let event = Event {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            category: new.category.trim().to_string(),
            date: new.date.trim().to_string(),
            time: new.time.trim().to_string(),
            location: new.location.trim().to_string(),
            image_url: image_url.to_string(),
            organizer: organizer.to_string(),
            organizer_id: organizer_id.map(str::to_string),
            max_attendees: new.max_attendees.unwrap_or(DEFAULT_MAX_ATTENDEES),
            attendees: 0,
            price_cents: new.price_cents.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        self.insert(&event).await?;

        info!(id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    /// Inserts a fully-formed event (seeding, imports).
    pub async fn insert(&self, event: &Event) -> DbResult<()> {
        debug!(id = %event.id, title = %event.title, "Inserting event");

        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, category, date, time, location, image_url,
                organizer, organizer_id, max_attendees, attendees, price_cents,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13,
                ?14, ?15
            )
            "#,
        )
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.image_url)
        .bind(&event.organizer)
        .bind(&event.organizer_id)
        .bind(event.max_attendees)
        .bind(event.attendees)
        .bind(event.price_cents)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a partial update.
    ///
    /// Capacity may not drop below the current attendee count. The check is
    /// part of the UPDATE, so a registration racing the update cannot slip
    /// past it.
    pub async fn update(&self, id: &str, update: &EventUpdate) -> DbResult<Event> {
        validate_event_update(update)?;

        debug!(id = %id, "Updating event");

        let trimmed = |v: &Option<String>| v.as_deref().map(|s| s.trim().to_string());

        let result = sqlx::query(
            r#"
            UPDATE events SET
                title         = COALESCE(?2, title),
                description   = COALESCE(?3, description),
                category      = COALESCE(?4, category),
                date          = COALESCE(?5, date),
                time          = COALESCE(?6, time),
                location      = COALESCE(?7, location),
                image_url     = COALESCE(?8, image_url),
                max_attendees = COALESCE(?9, max_attendees),
                price_cents   = COALESCE(?10, price_cents),
                updated_at    = ?11
            WHERE id = ?1
              AND (?9 IS NULL OR ?9 >= attendees)
            "#,
        )
        .bind(id)
        .bind(trimmed(&update.title))
        .bind(trimmed(&update.description))
        .bind(trimmed(&update.category))
        .bind(trimmed(&update.date))
        .bind(trimmed(&update.time))
        .bind(trimmed(&update.location))
        .bind(trimmed(&update.image_url))
        .bind(update.max_attendees)
        .bind(update.price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get(id).await?;
            return Err(CoreError::CapacityBelowAttendees {
                requested: update.max_attendees.unwrap_or(current.max_attendees),
                attendees: current.attendees,
            }
            .into());
        }

        let event = self.get(id).await?;
        info!(id = %event.id, "Event updated");
        Ok(event)
    }

    /// Deletes an event. Its tickets are kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", id));
        }

        info!(id = %id, "Event deleted");
        Ok(())
    }

    /// Takes one seat.
    ///
    /// ## Returns
    /// The event with its new attendee count, `EventFull` at capacity,
    /// `NotFound` for an unknown id.
    pub async fn register_attendee(&self, id: &str) -> DbResult<Event> {
        {
            let mut conn = self.pool.acquire().await?;
            take_seat(&mut conn, id).await?;
        }
        self.get(id).await
    }

    /// Gives one seat back. No-op at zero attendees.
    pub async fn release_attendee(&self, id: &str) -> DbResult<()> {
        give_back_seat(&self.pool, id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Shared Statements (pool or transaction)
// =============================================================================

pub(crate) async fn fetch_event<'e, E>(executor: E, id: &str) -> DbResult<Option<Event>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
    let event = sqlx::query_as::<Sqlite, Event>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(event)
}

/// Conditional increment. Reports `EventFull` or `NotFound` on 0 rows.
pub(crate) async fn take_seat(conn: &mut sqlx::SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET attendees = attendees + 1, updated_at = ?2
        WHERE id = ?1 AND attendees < max_attendees
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match fetch_event(&mut *conn, id).await? {
            Some(event) => Err(CoreError::EventFull {
                event_id: event.id,
                max_attendees: event.max_attendees,
            }
            .into()),
            None => Err(DbError::not_found("Event", id)),
        };
    }

    debug!(id = %id, "Seat taken");
    Ok(())
}

/// Conditional decrement. Missing events are ignored.
pub(crate) async fn give_back_seat<'e, E>(executor: E, id: &str) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE events
        SET attendees = attendees - 1, updated_at = ?2
        WHERE id = ?1 AND attendees > 0
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    debug!(id = %id, "Seat released");
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%text%` with LIKE wildcards escaped.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// Unit Tests
// =============================================================================
