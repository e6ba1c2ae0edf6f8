//! # Event Commands
//!
//! Browsing is open to everyone. Creating, editing and deleting require an
//! organizer session; editing and deleting also require that the event is
//! the organizer's own, unless it has no recorded owner (seeded listings).

use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, Session};
use evently_core::analytics::{self, DashboardSummary};
use evently_core::validation::validate_search_query;
use evently_core::{Event, EventFilter, EventUpdate, NewEvent, User};

/// All events, oldest listing first.
pub async fn list_events(state: &AppState) -> ApiResult<Vec<Event>> {
    debug!("list_events command");
    Ok(state.db.events().list().await?)
}

/// Free-text search plus category and location filters.
pub async fn search_events(state: &AppState, filter: EventFilter) -> ApiResult<Vec<Event>> {
    debug!(?filter, "search_events command");

    let text = filter
        .text
        .as_deref()
        .map(validate_search_query)
        .transpose()?;

    let filter = EventFilter { text, ..filter };
    Ok(state.db.events().search(&filter).await?)
}

pub async fn get_event(state: &AppState, id: &str) -> ApiResult<Event> {
    debug!(id = %id, "get_event command");
    Ok(state.db.events().get(id).await?)
}

/// Events created by the signed-in organizer.
pub async fn my_events(state: &AppState, session: &Session) -> ApiResult<Vec<Event>> {
    let user = session.require_organizer()?;
    debug!(user_id = %user.id, "my_events command");

    Ok(state.db.events().list_by_organizer(&user.id).await?)
}

pub async fn create_event(
    state: &AppState,
    session: &Session,
    new: NewEvent,
) -> ApiResult<Event> {
    let user = session.require_organizer()?;
    debug!(user_id = %user.id, title = %new.title, "create_event command");

    let event = state
        .db
        .events()
        .create(&new, &user.full_name(), Some(&user.id))
        .await?;

    Ok(event)
}

pub async fn update_event(
    state: &AppState,
    session: &Session,
    id: &str,
    update: EventUpdate,
) -> ApiResult<Event> {
    let user = session.require_organizer()?;
    debug!(id = %id, user_id = %user.id, "update_event command");

    let event = state.db.events().get(id).await?;
    ensure_owner(user, &event)?;

    Ok(state.db.events().update(id, &update).await?)
}

/// Deletes an event. Tickets already issued for it are kept.
pub async fn delete_event(state: &AppState, session: &Session, id: &str) -> ApiResult<()> {
    let user = session.require_organizer()?;
    debug!(id = %id, user_id = %user.id, "delete_event command");

    let event = state.db.events().get(id).await?;
    ensure_owner(user, &event)?;

    state.db.events().delete(id).await?;
    Ok(())
}

/// Totals, categories and attendance for the organizer's events.
pub async fn dashboard(state: &AppState, session: &Session) -> ApiResult<DashboardSummary> {
    let user = session.require_organizer()?;
    debug!(user_id = %user.id, "dashboard command");

    let events = state.db.events().list_by_organizer(&user.id).await?;

    let mut tickets = Vec::new();
    for event in &events {
        tickets.extend(state.db.tickets().list_by_event(&event.id).await?);
    }

    Ok(analytics::summarize(&events, &tickets))
}

pub(crate) fn ensure_owner(user: &User, event: &Event) -> ApiResult<()> {
    match &event.organizer_id {
        Some(owner) if owner != &user.id => {
            warn!(event_id = %event.id, user_id = %user.id, "Not the event owner");
            Err(ApiError::forbidden("You can only manage your own events"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::error::ErrorCode;
    use evently_core::Role;

    #[tokio::test]
    async fn test_create_requires_organizer_and_fills_defaults() {
        let state = test_support::state().await;
        let attendee = test_support::attendee(&state).await;

        let new = NewEvent {
            title: "Jazz Night".to_string(),
            description: "Live trio".to_string(),
            category: "Music".to_string(),
            date: "June 1, 2024".to_string(),
            time: "8:00 PM".to_string(),
            location: "New Orleans, LA".to_string(),
            ..NewEvent::default()
        };

        let err = create_event(&state, &attendee, new.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = create_event(&state, &Session::anonymous(), new.clone())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let organizer = test_support::organizer(&state).await;
        let event = create_event(&state, &organizer, new).await.unwrap();
        assert_eq!(event.max_attendees, evently_core::DEFAULT_MAX_ATTENDEES);
        assert_eq!(event.price_cents, 0);
        assert_eq!(event.organizer, "Ada Lovelace");
        assert_eq!(event.image_url, evently_core::DEFAULT_EVENT_IMAGE);
    }

    #[tokio::test]
    async fn test_update_checks_owner_and_capacity() {
        let state = test_support::state().await;
        let owner = test_support::organizer(&state).await;
        let event = test_support::event(&state, &owner, 10, 5_000).await;
        state.db.events().register_attendee(&event.id).await.unwrap();
        state.db.events().register_attendee(&event.id).await.unwrap();

        let other = test_support::signed_up(&state, "rival@example.com", Role::Organizer).await;
        let err = update_event(
            &state,
            &other,
            &event.id,
            EventUpdate {
                title: Some("Hijacked".to_string()),
                ..EventUpdate::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = update_event(
            &state,
            &owner,
            &event.id,
            EventUpdate {
                max_attendees: Some(1),
                ..EventUpdate::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let updated = update_event(
            &state,
            &owner,
            &event.id,
            EventUpdate {
                max_attendees: Some(2),
                title: Some("Tech Conference 2025".to_string()),
                ..EventUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.max_attendees, 2);
        assert_eq!(updated.title, "Tech Conference 2025");
        assert!(updated.is_full());
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let state = test_support::state().await;
        let owner = test_support::organizer(&state).await;
        let event = test_support::event(&state, &owner, 10, 0).await;

        let found = search_events(
            &state,
            EventFilter {
                text: Some("  conference ".to_string()),
                category: Some("technology".to_string()),
                location: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);

        let none = search_events(
            &state,
            EventFilter {
                location: Some("Boston".to_string()),
                ..EventFilter::default()
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());

        assert_eq!(my_events(&state, &owner).await.unwrap().len(), 1);

        delete_event(&state, &owner, &event.id).await.unwrap();
        let err = get_event(&state, &event.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(list_events(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_for_empty_organizer() {
        let state = test_support::state().await;
        let owner = test_support::organizer(&state).await;
        test_support::event(&state, &owner, 50, 2_500).await;

        let summary = dashboard(&state, &owner).await.unwrap();
        assert_eq!(summary.total_events, 1);
        assert_eq!(summary.total_capacity, 50);
        assert_eq!(summary.tickets_sold, 0);
        assert_eq!(summary.by_category[0].category, "Technology");
    }
}
