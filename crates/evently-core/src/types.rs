//! # Domain Types
//!
//! Core domain types used throughout Evently.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Event       │   │     Ticket      │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (TKT-...)   │   │  id (UUID)      │       │
//! │  │  max_attendees  │◄──│  event_id       │   │  code (NOCASE)  │       │
//! │  │  attendees      │   │  status         │   │  used_count     │       │
//! │  │  price_cents    │   │  qr_payload     │   │  usage_limit    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │           ▲                     ▲                     ▲                 │
//! │           │            ┌────────┴────────┐            │                 │
//! │           └────────────│   Reservation   │────────────┘                 │
//! │                        │ pending → committed / released                 │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tickets point at events by id only. Deleting an event leaves its tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// Role
// =============================================================================

/// What a user may do. Switchable at runtime through `switch_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates and manages events.
    Organizer,
    /// Browses events and buys tickets.
    Attendee,
}

impl Default for Role {
    fn default() -> Self {
        Role::Attendee
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Organizer => write!(f, "organizer"),
            Role::Attendee => write!(f, "attendee"),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account. The password hash is kept out of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[inline]
    pub fn is_organizer(&self) -> bool {
        self.role == Role::Organizer
    }
}

// =============================================================================
// Event
// =============================================================================

/// A schedulable item attendees register for.
///
/// `date` and `time` are display strings ("March 15, 2024", "9:00 AM").
/// Invariant: `0 <= attendees <= max_attendees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub image_url: String,
    /// Organizer display name.
    pub organizer: String,
    /// Creating user, absent for seeded events.
    pub organizer_id: Option<String>,
    pub max_attendees: i64,
    pub attendees: i64,
    /// Ticket price in cents.
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn seats_left(&self) -> i64 {
        (self.max_attendees - self.attendees).max(0)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.attendees >= self.max_attendees
    }

    /// Attendance as a percentage of capacity (0.0 for zero-capacity events).
    pub fn occupancy_percent(&self) -> f64 {
        if self.max_attendees <= 0 {
            return 0.0;
        }
        self.attendees as f64 * 100.0 / self.max_attendees as f64
    }
}

/// Input for creating an event.
///
/// Missing capacity defaults to [`crate::DEFAULT_MAX_ATTENDEES`], missing
/// price to free, missing image to [`crate::DEFAULT_EVENT_IMAGE`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub image_url: Option<String>,
    pub max_attendees: Option<i64>,
    pub price_cents: Option<i64>,
}

/// Partial update for an event. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub max_attendees: Option<i64>,
    pub price_cents: Option<i64>,
}

/// Search filters for the event listing. All set filters must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EventFilter {
    /// Case-insensitive match on title, description or location.
    pub text: Option<String>,
    /// Exact category, case-insensitive.
    pub category: Option<String>,
    /// Substring of the location, case-insensitive.
    pub location: Option<String>,
}

// =============================================================================
// Ticket Type / Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum TicketType {
    General,
    Vip,
    EarlyBird,
}

impl Default for TicketType {
    fn default() -> Self {
        TicketType::General
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketType::General => write!(f, "general"),
            TicketType::Vip => write!(f, "vip"),
            TicketType::EarlyBird => write!(f, "early-bird"),
        }
    }
}

/// Lifecycle of a ticket.
///
/// ```text
///            check_in
///   Active ───────────► Used
///     │
///     │ cancel
///     ▼
///   Cancelled
/// ```
/// Used and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
    Cancelled,
}

impl TicketStatus {
    #[inline]
    pub fn is_active(&self) -> bool {
        *self == TicketStatus::Active
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Active
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Active => write!(f, "active"),
            TicketStatus::Used => write!(f, "used"),
            TicketStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// Contact details captured at purchase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AttendeeInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl AttendeeInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Proof of registration for one user at one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ticket {
    /// `TKT-<unix millis>-<9 base36 chars>`.
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub ticket_type: TicketType,
    /// Amount paid after discount, before fees.
    pub price_cents: i64,
    pub status: TicketStatus,
    /// Composed [`crate::ticket::TicketPayload`] string.
    pub qr_payload: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub attendee: AttendeeInfo,
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,
}

impl Ticket {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Coupon
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is basis points of the amount.
    Percentage,
    /// `discount_value` is cents.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum CouponType {
    General,
    Vip,
    EarlyBird,
}

impl CouponType {
    /// Ticket type issued when a coupon of this type is applied.
    pub fn ticket_type(&self) -> TicketType {
        match self {
            CouponType::Vip => TicketType::Vip,
            CouponType::General | CouponType::EarlyBird => TicketType::General,
        }
    }
}

impl Default for CouponType {
    fn default() -> Self {
        CouponType::General
    }
}

/// A discount code with usage and validity constraints.
///
/// Invariant: `used_count <= usage_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    pub id: String,
    /// Matched case-insensitively.
    pub code: String,
    pub discount_type: DiscountType,
    /// Basis points for percentage coupons, cents for fixed ones.
    pub discount_value: i64,
    pub min_purchase_cents: Option<i64>,
    pub max_discount_cents: Option<i64>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    pub usage_limit: i64,
    pub used_count: i64,
    pub is_active: bool,
    /// Event ids the coupon is restricted to. `None` means any event.
    pub applicable_events: Option<Vec<String>>,
    pub coupon_type: CouponType,
}

impl Coupon {
    /// Percentage as a rate. Only meaningful for percentage coupons.
    #[inline]
    pub fn rate(&self) -> Rate {
        Rate::from_bps(self.discount_value.clamp(0, u32::MAX as i64) as u32)
    }

    #[inline]
    pub fn uses_left(&self) -> i64 {
        (self.usage_limit - self.used_count).max(0)
    }

    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_from && now <= self.valid_until
    }

    pub fn applies_to(&self, event_id: &str) -> bool {
        match &self.applicable_events {
            Some(events) => events.iter().any(|e| e == event_id),
            None => true,
        }
    }
}

/// Input for creating a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_purchase_cents: Option<i64>,
    pub max_discount_cents: Option<i64>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    pub usage_limit: i64,
    pub applicable_events: Option<Vec<String>>,
    pub coupon_type: CouponType,
}

/// Append-only record of one coupon application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CouponUsage {
    pub id: String,
    pub coupon_id: String,
    pub user_id: String,
    pub event_id: String,
    pub discount_cents: i64,
    #[ts(as = "String")]
    pub used_at: DateTime<Utc>,
}

// =============================================================================
// Reservation
// =============================================================================

/// Lifecycle of a checkout hold.
///
/// ```text
///   Pending ──commit──► Committed
///      │
///      └────release───► Released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Committed,
    Released,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "pending"),
            ReservationStatus::Committed => write!(f, "committed"),
            ReservationStatus::Released => write!(f, "released"),
        }
    }
}

/// A seat (and optionally one coupon use) held between payment start and
/// payment outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub coupon_id: Option<String>,
    /// Pre-discount amount.
    pub amount_cents: i64,
    pub discount_cents: i64,
    pub status: ReservationStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Amount owed before fees.
    #[inline]
    pub fn net(&self) -> Money {
        Money::from_cents(self.amount_cents - self.discount_cents)
    }
}

// =============================================================================
// Bank Account
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
}

/// Payer bank details for a transfer. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BankAccount {
    pub account_number: String,
    pub routing_number: String,
    pub account_type: AccountType,
    pub bank_name: String,
}

impl BankAccount {
    /// Account number with all but the last four characters hidden.
    pub fn masked_number(&self) -> String {
        let chars: Vec<char> = self.account_number.trim().chars().collect();
        let hidden = chars.len().saturating_sub(4);
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
