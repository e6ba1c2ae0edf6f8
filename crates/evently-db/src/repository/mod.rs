//! # Repository Module
//!
//! Database repository implementations for Evently.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command (apps/evently)                                                │
//! │       │                                                                 │
//! │       │  db.events().search(&filter)                                   │
//! │       ▼                                                                 │
//! │  EventRepository                                                       │
//! │  ├── search(&self, filter)                                             │
//! │  ├── get(&self, id)                                                    │
//! │  ├── create(&self, new, organizer, organizer_id)                       │
//! │  └── register_attendee(&self, id)                                      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Multi-table writes (checkout) live in one repository so a single      │
//! │  transaction covers them.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`event::EventRepository`] - Event CRUD, search, capacity guard
//! - [`ticket::TicketRepository`] - Ticket reads, check-in, cancel
//! - [`coupon::CouponRepository`] - Coupons, preview, usage history
//! - [`user::UserRepository`] - Accounts and credentials
//! - [`checkout::CheckoutRepository`] - Reserve / commit / release

pub mod checkout;
pub mod coupon;
pub mod event;
pub mod ticket;
pub mod user;
