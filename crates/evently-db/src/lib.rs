//! # evently-db: Storage Layer for Evently
//!
//! SQLite keyed record store for events, tickets, coupons, users and
//! checkout reservations, accessed asynchronously through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Evently Data Flow                                │
//! │                                                                         │
//! │  Command (purchase_with_card)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    evently-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ EventRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TicketRepo    │    │ 001_init.sql │  │   │
//! │  │   │ WAL, FKs on   │    │ CouponRepo    │    │              │  │   │
//! │  │   │               │    │ CheckoutRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/evently.db                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`seed`] - Demo events and coupons
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evently_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("evently.db")).await?;
//!
//! let reserved = db.checkout().reserve(&request).await?;
//! let ticket = db.checkout().commit(&reserved.reservation.id, &attendee, Some(&txn)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::checkout::{CheckoutRepository, ReserveRequest, ReservedCheckout};
pub use repository::coupon::CouponRepository;
pub use repository::event::EventRepository;
pub use repository::ticket::TicketRepository;
pub use repository::user::UserRepository;
pub use seed::{seed_demo_data, SeedReport};
