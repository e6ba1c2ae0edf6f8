//! # Ticket Commands
//!
//! Attendees see and cancel their own tickets. Organizers check tickets in
//! at the door and can act on any ticket.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::event::ensure_owner;
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, Session};
use evently_core::qr::QrPattern;
use evently_core::{Ticket, User};

/// Pixel size of one module in rendered QR codes.
const QR_MODULE_PX: u32 = 8;

/// A ticket's QR pattern in both renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketQr {
    pub ticket_id: String,
    pub payload: String,
    pub svg: String,
    pub text: String,
}

/// The signed-in user's tickets, newest first.
pub async fn my_tickets(state: &AppState, session: &Session) -> ApiResult<Vec<Ticket>> {
    let user = session.require_user()?;
    debug!(user_id = %user.id, "my_tickets command");

    Ok(state.db.tickets().list_by_user(&user.id).await?)
}

/// Tickets issued for one of the organizer's events.
pub async fn event_tickets(
    state: &AppState,
    session: &Session,
    event_id: &str,
) -> ApiResult<Vec<Ticket>> {
    let user = session.require_organizer()?;
    debug!(event_id = %event_id, "event_tickets command");

    let event = state.db.events().get(event_id).await?;
    ensure_owner(user, &event)?;

    Ok(state.db.tickets().list_by_event(event_id).await?)
}

pub async fn get_ticket(state: &AppState, session: &Session, id: &str) -> ApiResult<Ticket> {
    let user = session.require_user()?;
    debug!(id = %id, "get_ticket command");

    let ticket = state.db.tickets().get(id).await?;
    ensure_can_access(user, &ticket)?;
    Ok(ticket)
}

/// Admits the holder. Used and cancelled tickets are rejected.
pub async fn check_in_ticket(state: &AppState, session: &Session, id: &str) -> ApiResult<Ticket> {
    let user = session.require_organizer()?;
    debug!(id = %id, user_id = %user.id, "check_in_ticket command");

    Ok(state.db.tickets().check_in(id).await?)
}

pub async fn cancel_ticket(state: &AppState, session: &Session, id: &str) -> ApiResult<Ticket> {
    let user = session.require_user()?;
    debug!(id = %id, user_id = %user.id, "cancel_ticket command");

    let ticket = state.db.tickets().get(id).await?;
    ensure_can_access(user, &ticket)?;

    Ok(state.db.tickets().cancel(id).await?)
}

pub async fn ticket_qr(state: &AppState, session: &Session, id: &str) -> ApiResult<TicketQr> {
    let ticket = get_ticket(state, session, id).await?;
    let pattern = QrPattern::from_payload(&ticket.qr_payload);

    Ok(TicketQr {
        svg: pattern.to_svg(QR_MODULE_PX),
        text: pattern.to_text(),
        ticket_id: ticket.id,
        payload: ticket.qr_payload,
    })
}

fn ensure_can_access(user: &User, ticket: &Ticket) -> ApiResult<()> {
    if ticket.user_id == user.id || user.is_organizer() {
        return Ok(());
    }
    warn!(ticket_id = %ticket.id, user_id = %user.id, "Ticket belongs to someone else");
    Err(ApiError::forbidden("This ticket belongs to another user"))
}
