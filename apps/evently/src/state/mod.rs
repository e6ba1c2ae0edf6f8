//! # State Module
//!
//! Everything a command needs, bundled into one `AppState`. The caller's
//! identity is not part of it; commands take a [`Session`] separately.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  AppConfig::load() ──► AppState::open(config)                           │
//! │                              │                                          │
//! │          ┌───────────────────┼───────────────────┐                      │
//! │          ▼                   ▼                   ▼                      │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐           │
//! │  │   Database   │  │    AppConfig     │  │    Services      │           │
//! │  │  (SQLite     │  │   (read-only)    │  │  card, bank,     │           │
//! │  │   pool)      │  │                  │  │  mailer          │           │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘           │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • Services: stateless apart from the mailer outbox (Mutex)            │
//! │  • AppConfig: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;

pub use config::{
    AppConfig, BankSettings, ConfigError, ConfigResult, DatabaseSettings, EmailSettings,
    PaymentSettings,
};
pub use session::Session;

use chrono::{Duration, Utc};
use tracing::info;

use crate::error::ApiResult;
use crate::services::Services;
use evently_db::pool::IN_MEMORY_PATH;
use evently_db::{seed_demo_data, Database, DbConfig};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub services: Services,
}

impl AppState {
    /// Opens the database, seeds demo data if configured and releases
    /// reservations left pending by an earlier run.
    pub async fn open(config: AppConfig) -> ApiResult<Self> {
        let path = config.database_path()?;
        let db_config = if path.as_os_str() == IN_MEMORY_PATH {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
        };

        let db = Database::new(db_config).await?;

        if config.database.seed_demo_data {
            seed_demo_data(&db).await?;
        }

        let cutoff = Utc::now() - Duration::minutes(config.database.stale_reservation_mins as i64);
        let released = db.checkout().release_stale(cutoff).await?;

        let services = Services::from_config(&config);

        info!(released, "Application state ready");
        Ok(AppState {
            db,
            config,
            services,
        })
    }

    /// Wraps an existing database with services built from `config`.
    pub fn with_database(db: Database, config: AppConfig) -> Self {
        let services = Services::from_config(&config);
        AppState {
            db,
            config,
            services,
        }
    }
}
