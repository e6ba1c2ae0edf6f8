//! # Evently App Library
//!
//! Orchestration layer for Evently: configuration, the caller's session,
//! simulated external services and every command a front-end can invoke.
//!
//! ## Module Organization
//! ```text
//! evently_app/
//! ├── lib.rs          ◄─── You are here (tracing setup & demo walkthrough)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (database, config, services)
//! │   ├── config.rs   ◄─── AppConfig loading (defaults, TOML, env)
//! │   └── session.rs  ◄─── Session (explicit caller identity)
//! ├── services/
//! │   ├── payment.rs  ◄─── Simulated card gateway
//! │   ├── bank.rs     ◄─── Simulated bank transfers
//! │   └── email.rs    ◄─── Simulated mailer
//! ├── commands/
//! │   ├── auth.rs     ◄─── Signup, login, role switch
//! │   ├── event.rs    ◄─── Event CRUD, search, dashboard
//! │   ├── coupon.rs   ◄─── Coupon preview and management
//! │   ├── checkout.rs ◄─── Quotes and purchases
//! │   ├── ticket.rs   ◄─── Check-in, cancel, QR
//! │   └── config.rs   ◄─── Effective configuration
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod services;
pub mod state;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::auth::{self, LoginRequest, SignupRequest};
use commands::checkout::{self, CardPurchaseRequest, PaymentMethod};
use commands::{event, ticket};
use error::{ApiResult, ErrorCode};
use evently_core::{AttendeeInfo, Role};
use state::{AppConfig, AppState, Session};

const DEMO_EMAIL: &str = "demo@evently.app";
const DEMO_PASSWORD: &str = "Demo1234!";

/// Runs the demo walkthrough against the configured database.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: info,evently=debug,sqlx=warn; override with RUST_LOG     │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults → evently.toml → EVENTLY_* env vars                      │
/// │                                                                         │
/// │  3. Open State ───────────────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │     • Demo events and coupons seeded                                    │
/// │     • Stale pending reservations released                               │
/// │                                                                         │
/// │  4. Walkthrough ──────────────────────────────────────────────────────► │
/// │     • sign in, browse, quote, buy a ticket, print its QR code           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ApiResult<()> {
    init_tracing();

    info!("Starting Evently");

    let config = AppConfig::load(None)?;
    let state = AppState::open(config).await?;

    let mut session = Session::anonymous();
    sign_in_demo_user(&state, &mut session).await?;

    let events = event::list_events(&state).await?;
    println!("\n📅 {} events", events.len());
    for e in &events {
        println!(
            "   {:<28} {:>10}  {:>5}/{:<5} {}",
            e.title,
            e.price().to_string(),
            e.attendees,
            e.max_attendees,
            e.location
        );
    }

    let Some(target) = events.iter().find(|e| !e.is_full()) else {
        println!("\nEvery event is sold out.");
        return Ok(());
    };

    let mut coupon = Some("WELCOME20");
    let quote = match checkout::quote(&state, &target.id, coupon, PaymentMethod::Card).await {
        Ok(quote) => quote,
        Err(err) if err.code == ErrorCode::CouponRejected => {
            warn!("Demo coupon not usable: {}", err.message);
            coupon = None;
            checkout::quote(&state, &target.id, None, PaymentMethod::Card).await?
        }
        Err(err) => return Err(err),
    };
    println!(
        "\n💳 {}: price {}, discount {}, fees {}, total {}",
        target.title, quote.ticket_price, quote.discount, quote.fees.fees, quote.fees.total
    );

    let user = session.require_user()?.clone();
    let request = CardPurchaseRequest {
        event_id: target.id.clone(),
        coupon_code: coupon.map(str::to_string),
        attendee: AttendeeInfo {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: None,
        },
    };

    match checkout::purchase_with_card(&state, &session, request).await {
        Ok(purchase) => {
            println!(
                "\n🎟️  Ticket {} ({:?}), charged {}",
                purchase.ticket.id, purchase.ticket.ticket_type, purchase.charged.total
            );
            let qr = ticket::ticket_qr(&state, &session, &purchase.ticket.id).await?;
            println!("{}", qr.text);
        }
        Err(err) if err.code == ErrorCode::PaymentError => {
            warn!("Demo purchase declined: {}", err.message);
            println!("\n❌ {}", err.message);
        }
        Err(err) => return Err(err),
    }

    let tickets = ticket::my_tickets(&state, &session).await?;
    println!("You hold {} ticket(s).", tickets.len());

    state.db.close().await;
    Ok(())
}

/// Logs the demo user in, creating the account on first run.
async fn sign_in_demo_user(state: &AppState, session: &mut Session) -> ApiResult<()> {
    let login = auth::login(
        state,
        session,
        LoginRequest {
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
        },
    )
    .await;

    match login {
        Ok(_) => Ok(()),
        Err(err) if err.code == ErrorCode::NotFound => {
            auth::signup(
                state,
                session,
                SignupRequest {
                    email: DEMO_EMAIL.to_string(),
                    password: DEMO_PASSWORD.to_string(),
                    first_name: "Demo".to_string(),
                    last_name: "User".to_string(),
                    role: Some(Role::Attendee),
                },
            )
            .await?;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=evently=trace` - Show trace for evently crates only
/// - Default: info, debug for evently crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,evently=debug,sqlx=warn"));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
