//! # Demo Data
//!
//! Default events and coupons for a fresh database. Used by the `seed`
//! binary and by the app when `seed_demo_data` is on.
//!
//! Seeding is idempotent: events are only added to an empty events table,
//! coupons only when their code is missing.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::pool::Database;
use evently_core::{Coupon, CouponType, DiscountType, Event};

/// What a seeding run added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub events_added: usize,
    pub coupons_added: usize,
}

struct DefaultEvent {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    date: &'static str,
    time: &'static str,
    location: &'static str,
    image_url: &'static str,
    organizer: &'static str,
    attendees: i64,
    max_attendees: i64,
    price_cents: i64,
    /// Day of January 2024 the event was listed.
    listed_on: u32,
}

const DEFAULT_EVENTS: &[DefaultEvent] = &[
    DefaultEvent {
        title: "Tech Conference 2024",
        description: "Join industry leaders for cutting-edge tech insights and networking opportunities",
        category: "Technology",
        date: "March 15, 2024",
        time: "9:00 AM",
        location: "San Francisco, CA",
        image_url: evently_core::DEFAULT_EVENT_IMAGE,
        organizer: "Tech Events Inc.",
        attendees: 245,
        max_attendees: 500,
        price_cents: 29_900,
        listed_on: 1,
    },
    DefaultEvent {
        title: "Creative Workshop",
        description: "Hands-on creative design workshop for professionals and enthusiasts",
        category: "Workshop",
        date: "March 22, 2024",
        time: "2:00 PM",
        location: "New York, NY",
        image_url: "https://images.unsplash.com/photo-1517245386807-bb43f82c33c4?w=800&h=400&fit=crop",
        organizer: "Creative Studio",
        attendees: 89,
        max_attendees: 100,
        price_cents: 15_000,
        listed_on: 2,
    },
    DefaultEvent {
        title: "Music Festival",
        description: "Three days of amazing music and entertainment with top artists",
        category: "Music",
        date: "April 5, 2024",
        time: "6:00 PM",
        location: "Austin, TX",
        image_url: "https://images.unsplash.com/photo-1459749411175-04bf5292ceea?w=800&h=400&fit=crop",
        organizer: "Festival Productions",
        attendees: 1_200,
        max_attendees: 5_000,
        price_cents: 45_000,
        listed_on: 3,
    },
];

/// The three demo events.
pub fn default_events() -> Vec<Event> {
    DEFAULT_EVENTS
        .iter()
        .map(|e| {
            let listed = listed_at(e.listed_on);
            Event {
                id: Uuid::new_v4().to_string(),
                title: e.title.to_string(),
                description: e.description.to_string(),
                category: e.category.to_string(),
                date: e.date.to_string(),
                time: e.time.to_string(),
                location: e.location.to_string(),
                image_url: e.image_url.to_string(),
                organizer: e.organizer.to_string(),
                organizer_id: None,
                max_attendees: e.max_attendees,
                attendees: e.attendees,
                price_cents: e.price_cents,
                created_at: listed,
                updated_at: listed,
            }
        })
        .collect()
}

/// WELCOME20, VIP50 and EARLYBIRD, valid from 30 days before `now`.
pub fn default_coupons(now: DateTime<Utc>) -> Vec<Coupon> {
    let valid_from = now - Duration::days(30);

    vec![
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: "WELCOME20".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 2_000,
            min_purchase_cents: None,
            max_discount_cents: Some(5_000),
            valid_from,
            valid_until: now + Duration::days(365),
            usage_limit: 100,
            used_count: 15,
            is_active: true,
            applicable_events: None,
            coupon_type: CouponType::General,
        },
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: "VIP50".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 5_000,
            min_purchase_cents: Some(10_000),
            max_discount_cents: None,
            valid_from,
            valid_until: now + Duration::days(365),
            usage_limit: 50,
            used_count: 8,
            is_active: true,
            applicable_events: None,
            coupon_type: CouponType::Vip,
        },
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: "EARLYBIRD".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 1_500,
            min_purchase_cents: None,
            max_discount_cents: Some(3_000),
            valid_from,
            valid_until: now + Duration::days(180),
            usage_limit: 200,
            used_count: 45,
            is_active: true,
            applicable_events: None,
            coupon_type: CouponType::EarlyBird,
        },
    ]
}

/// Adds the demo events and coupons that are missing.
pub async fn seed_demo_data(db: &Database) -> DbResult<SeedReport> {
    let mut report = SeedReport::default();

    if db.events().count().await? == 0 {
        for event in default_events() {
            db.events().insert(&event).await?;
            report.events_added += 1;
        }
    } else {
        debug!("Events table not empty, skipping default events");
    }

    for coupon in default_coupons(Utc::now()) {
        if db.coupons().get_by_code(&coupon.code).await?.is_some() {
            continue;
        }
        db.coupons().insert(&coupon).await?;
        report.coupons_added += 1;
    }

    info!(
        events = report.events_added,
        coupons = report.coupons_added,
        "Demo data seeded"
    );
    Ok(report)
}

fn listed_at(day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
        .unwrap_or_else(Utc::now)
}

// =============================================================================
// Unit Tests
// =============================================================================
