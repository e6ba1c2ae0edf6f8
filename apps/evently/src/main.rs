//! # Evently Entry Point
//!
//! Demo binary: opens the configured database, signs in a demo account and
//! buys a ticket for the first event with seats left.
//!
//! ```text
//! evently ──► evently_app::run()
//!               ├── AppConfig::load (evently.toml, EVENTLY_* env vars)
//!               ├── AppState::open  (SQLite, seed, stale reservations)
//!               └── commands::*     (login, list, quote, purchase, QR)
//! ```
//!
//! ## Usage
//! ```bash
//! EVENTLY_DB_PATH=./evently.db RUST_LOG=info cargo run --bin evently
//! ```

#[tokio::main]
async fn main() {
    if let Err(err) = evently_app::run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
