//! # Analytics
//!
//! Organizer dashboard summaries computed from events and tickets.
//!
//! Revenue counts every ticket that is not cancelled, at the price paid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Event, Ticket, TicketStatus};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub total_events: usize,
    pub total_attendees: i64,
    pub total_capacity: i64,
    pub revenue: Money,
    pub tickets_sold: usize,
    pub tickets_checked_in: usize,
    pub tickets_cancelled: usize,
    pub by_category: Vec<CategoryCount>,
    pub attendance: Vec<EventAttendance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryCount {
    pub category: String,
    pub events: usize,
}

/// Attendance against capacity for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EventAttendance {
    pub event_id: String,
    pub title: String,
    pub attendees: i64,
    pub max_attendees: i64,
    pub occupancy_percent: f64,
    pub revenue: Money,
}

/// Revenue from tickets that were not cancelled.
pub fn revenue<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Money {
    tickets
        .into_iter()
        .filter(|t| t.status != TicketStatus::Cancelled)
        .map(Ticket::price)
        .sum()
}

/// Event count per category, sorted by category name.
pub fn events_by_category(events: &[Event]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.category.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(category, events)| CategoryCount {
            category: category.to_string(),
            events,
        })
        .collect()
}

/// Builds the dashboard over a set of events and the tickets issued for them.
///
/// Tickets for events not in `events` still count toward totals.
pub fn summarize(events: &[Event], tickets: &[Ticket]) -> DashboardSummary {
    let attendance = events
        .iter()
        .map(|event| {
            EventAttendance {
                event_id: event.id.clone(),
                title: event.title.clone(),
                attendees: event.attendees,
                max_attendees: event.max_attendees,
                occupancy_percent: event.occupancy_percent(),
                revenue: revenue(tickets.iter().filter(|t| t.event_id == event.id)),
            }
        })
        .collect();

    let count = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();

    DashboardSummary {
        total_events: events.len(),
        total_attendees: events.iter().map(|e| e.attendees).sum(),
        total_capacity: events.iter().map(|e| e.max_attendees).sum(),
        revenue: revenue(tickets.iter()),
        tickets_sold: tickets.len(),
        tickets_checked_in: count(TicketStatus::Used),
        tickets_cancelled: count(TicketStatus::Cancelled),
        by_category: events_by_category(events),
        attendance,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
