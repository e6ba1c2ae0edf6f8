//! # evently-core: Pure Business Logic for Evently
//!
//! This crate contains the pricing, coupon, and ticket identity rules of
//! Evently as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Evently Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/evently (commands + Session)               │   │
//! │  │    signup ──► browse ──► apply coupon ──► purchase ──► check-in │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ evently-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  coupon  │ │   fees   │ │  ticket  │ │    qr    │          │   │
//! │  │   │ evaluate │ │  quote   │ │ id/load  │ │ pattern  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  evently-db (Database Layer)                    │   │
//! │  │          SQLite tables, migrations, checkout transactions       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Event, Ticket, Coupon, User, Reservation)
//! - [`money`] - Money and Rate types with integer arithmetic
//! - [`coupon`] - Coupon evaluation and discount computation
//! - [`fees`] - Card and bank-transfer fee schedules
//! - [`ticket`] - Ticket and transaction id generation, QR payloads
//! - [`qr`] - Deterministic cosmetic QR module pattern
//! - [`validation`] - Input rules (passwords, bank accounts, event fields)
//! - [`analytics`] - Organizer dashboard summaries
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use evently_core::fees::FeeSchedule;
//! use evently_core::money::Money;
//!
//! let quote = FeeSchedule::BANK_TRANSFER.quote(Money::from_cents(10_000));
//!
//! // 0.5% of $100.00 is $0.50, below the $1.50 floor
//! assert_eq!(quote.fees.cents(), 150);
//! assert_eq!(quote.total.cents(), 10_150);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod coupon;
pub mod error;
pub mod fees;
pub mod money;
pub mod qr;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use coupon::{AppliedDiscount, CouponRejection};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fees::{FeeQuote, FeeSchedule};
pub use money::{Money, Rate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Capacity given to an event created without an explicit maximum.
pub const DEFAULT_MAX_ATTENDEES: i64 = 100;

/// Image shown for events created without one.
pub const DEFAULT_EVENT_IMAGE: &str =
    "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=800&h=400&fit=crop";

/// Organizer display name used when the creating user has no name on record.
pub const DEFAULT_ORGANIZER: &str = "Evently Organizer";
