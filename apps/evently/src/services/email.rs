//! # Mailer
//!
//! Simulated mail delivery. Messages are logged and kept in an in-process
//! outbox instead of being handed to an SMTP server. The outbox holds the
//! most recent [`OUTBOX_CAPACITY`] messages.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ServiceError, ServiceResult};
use evently_core::qr::QrPattern;
use evently_core::{Event, Ticket};

/// Pixel size of one QR module in attachments.
const QR_MODULE_PX: u32 = 8;

/// Messages kept in the outbox before the oldest is dropped.
pub const OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    enabled: bool,
    from: String,
    delay: Duration,
    outbox: Arc<Mutex<VecDeque<EmailMessage>>>,
}

impl Mailer {
    pub fn new(enabled: bool, from: String, delay: Duration) -> Self {
        Mailer {
            enabled,
            from,
            delay,
            outbox: Arc::new(Mutex::new(VecDeque::with_capacity(OUTBOX_CAPACITY))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Delivers a message. Returns `false` when email is disabled.
    pub async fn send(&self, message: EmailMessage) -> ServiceResult<bool> {
        if !self.enabled {
            debug!(to = %message.to, subject = %message.subject, "Email disabled, not sending");
            return Ok(false);
        }

        if !message.to.contains('@') {
            return Err(ServiceError::EmailFailed(format!(
                "invalid recipient: {}",
                message.to
            )));
        }

        debug!(to = %message.to, subject = %message.subject, "Sending email");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Email sent"
        );
        let mut outbox = self.outbox();
        if outbox.len() == OUTBOX_CAPACITY {
            outbox.pop_front();
        }
        outbox.push_back(message);
        Ok(true)
    }

    /// Builds the booking confirmation for a freshly issued ticket.
    pub fn booking_confirmation(&self, event: &Event, ticket: &Ticket) -> EmailMessage {
        let name = ticket.attendee.full_name();
        let body = format!(
            "Booking Confirmed!\n\
             \n\
             Hello {name}!\n\
             \n\
             Your ticket for {title} has been confirmed.\n\
             \n\
             Event Details\n\
             Event: {title}\n\
             Date: {date} at {time}\n\
             Location: {location}\n\
             Ticket ID: {ticket_id}\n\
             Price paid: {price}\n\
             \n\
             Your QR code ticket is attached to this email. Please present it at the event entrance.\n\
             \n\
             Thank you for using Evently! We hope you enjoy the event.\n",
            title = event.title,
            date = event.date,
            time = event.time,
            location = event.location,
            ticket_id = ticket.id,
            price = ticket.price(),
        );

        let qr = QrPattern::from_payload(&ticket.qr_payload);

        EmailMessage {
            from: self.from.clone(),
            to: ticket.attendee.email.clone(),
            subject: format!("🎟️ Your ticket for {}", event.title),
            body,
            attachments: vec![Attachment {
                filename: format!("ticket-{}.svg", ticket.id),
                content_type: "image/svg+xml".to_string(),
                content: qr.to_svg(QR_MODULE_PX),
            }],
        }
    }

    /// Recently delivered messages, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox().iter().cloned().collect()
    }

    fn outbox(&self) -> MutexGuard<'_, VecDeque<EmailMessage>> {
        // A panic while pushing leaves the queue intact.
        self.outbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use evently_core::{AttendeeInfo, TicketStatus, TicketType};

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: "evt-1".to_string(),
            title: "Music Festival".to_string(),
            description: "Three days".to_string(),
            category: "Music".to_string(),
            date: "April 5, 2024".to_string(),
            time: "6:00 PM".to_string(),
            location: "Austin, TX".to_string(),
            image_url: evently_core::DEFAULT_EVENT_IMAGE.to_string(),
            organizer: "Festival Productions".to_string(),
            organizer_id: None,
            max_attendees: 5_000,
            attendees: 1_201,
            price_cents: 45_000,
            created_at: now,
            updated_at: now,
        }
    }

    fn ticket() -> Ticket {
        Ticket {
            id: "TKT-1712345678901-abc123def".to_string(),
            event_id: "evt-1".to_string(),
            user_id: "u1".to_string(),
            ticket_type: TicketType::General,
            price_cents: 45_000,
            status: TicketStatus::Active,
            qr_payload: "EVENTLY|TKT-1712345678901-abc123def|evt-1|u1|Ada Lovelace".to_string(),
            attendee: AttendeeInfo {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            },
            transaction_id: Some("txn_1".to_string()),
            purchased_at: Utc::now(),
        }
    }

    #[test]
    fn test_booking_confirmation_contents() {
        let mailer = Mailer::new(true, "tickets@evently.app".to_string(), Duration::ZERO);
        let message = mailer.booking_confirmation(&event(), &ticket());

        assert_eq!(message.to, "ada@example.com");
        assert_eq!(message.subject, "🎟️ Your ticket for Music Festival");
        assert!(message.body.contains("Hello Ada Lovelace!"));
        assert!(message.body.contains("Ticket ID: TKT-1712345678901-abc123def"));
        assert!(message.body.contains("Location: Austin, TX"));

        let attachment = &message.attachments[0];
        assert_eq!(attachment.filename, "ticket-TKT-1712345678901-abc123def.svg");
        assert!(attachment.content.starts_with("<svg"));
    }

    #[tokio::test]
    async fn test_send_records_message() {
        let mailer = Mailer::new(true, "tickets@evently.app".to_string(), Duration::ZERO);
        let message = mailer.booking_confirmation(&event(), &ticket());

        assert!(mailer.send(message.clone()).await.unwrap());
        assert_eq!(mailer.sent(), vec![message]);
    }

    #[tokio::test]
    async fn test_outbox_keeps_most_recent() {
        let mailer = Mailer::new(true, "tickets@evently.app".to_string(), Duration::ZERO);
        for i in 0..=OUTBOX_CAPACITY {
            let mut message = mailer.booking_confirmation(&event(), &ticket());
            message.subject = format!("message {i}");
            mailer.send(message).await.unwrap();
        }

        let sent = mailer.sent();
        assert_eq!(sent.len(), OUTBOX_CAPACITY);
        assert_eq!(sent[0].subject, "message 1");
        assert_eq!(sent[OUTBOX_CAPACITY - 1].subject, format!("message {OUTBOX_CAPACITY}"));
    }

    #[tokio::test]
    async fn test_disabled_and_invalid_recipient() {
        let disabled = Mailer::new(false, "tickets@evently.app".to_string(), Duration::ZERO);
        let message = disabled.booking_confirmation(&event(), &ticket());
        assert!(!disabled.send(message).await.unwrap());
        assert!(disabled.sent().is_empty());

        let mailer = Mailer::new(true, "tickets@evently.app".to_string(), Duration::ZERO);
        let mut message = mailer.booking_confirmation(&event(), &ticket());
        message.to = "nobody".to_string();
        assert!(matches!(
            mailer.send(message).await,
            Err(ServiceError::EmailFailed(_))
        ));
    }
}
