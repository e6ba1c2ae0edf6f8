//! # Commands Module
//!
//! Every operation a front-end can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── auth.rs      ◄─── Signup, login, logout, role switch
//! ├── event.rs     ◄─── Event CRUD, search, dashboard
//! ├── coupon.rs    ◄─── Preview, VIP list, create, usage history
//! ├── checkout.rs  ◄─── Quotes, card and bank purchases
//! ├── ticket.rs    ◄─── My tickets, check-in, cancel, QR
//! └── config.rs    ◄─── Effective configuration
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  let state = AppState::open(AppConfig::load(None)?).await?;             │
//! │  let mut session = Session::anonymous();                                │
//! │                                                                         │
//! │  auth::login(&state, &mut session, req).await?;                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  checkout::purchase_with_card(&state, &session, req).await?             │
//! │         │  session.require_user()                                       │
//! │         │  db.checkout().reserve(..)                                    │
//! │         │  services.cards.charge(total)                                 │
//! │         │  db.checkout().commit(..) or release(..)                      │
//! │         ▼                                                               │
//! │  Result<PurchaseResponse, ApiError>  (serializable both ways)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands take the [`AppState`](crate::state::AppState) and the caller's
//! [`Session`](crate::state::Session) explicitly. Responses are serde types
//! with camelCase fields.

pub mod auth;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod event;
pub mod ticket;
