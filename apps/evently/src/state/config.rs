//! # Application Configuration
//!
//! Stores configuration loaded at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (this file)                                               │
//! │  2. Config file                                                        │
//! │     ~/.config/evently/evently.toml (Linux)                             │
//! │     ~/Library/Application Support/app.evently.evently/evently.toml     │
//! │  3. Environment variables (EVENTLY_*)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [database]
//! path = "/var/lib/evently/evently.db"
//! seed_demo_data = true
//! stale_reservation_mins = 30
//!
//! [payment]
//! decline_rate_bps = 1000   # 10% of card charges are declined
//! delay_ms = 2000
//!
//! [bank]
//! delay_ms = 2000
//!
//! [email]
//! enabled = true
//! delay_ms = 1000
//! from = "tickets@evently.app"
//! ```
//!
//! Configuration is read-only after loading, so no lock is needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use evently_core::Rate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "evently.toml";

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file. `None` uses `evently.db` in the platform data dir.
    pub path: Option<PathBuf>,

    /// Insert default events and coupons at startup.
    pub seed_demo_data: bool,

    /// Pending reservations older than this are released at startup.
    pub stale_reservation_mins: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            seed_demo_data: true,
            stale_reservation_mins: 30,
        }
    }
}

/// Simulated card gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    /// Share of charges declined, in basis points.
    pub decline_rate_bps: u32,
    pub delay_ms: u64,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        PaymentSettings {
            decline_rate_bps: 1_000,
            delay_ms: 2_000,
        }
    }
}

impl PaymentSettings {
    pub fn decline_rate(&self) -> Rate {
        Rate::from_bps(self.decline_rate_bps)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Simulated bank transfer processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankSettings {
    pub delay_ms: u64,
}

impl Default for BankSettings {
    fn default() -> Self {
        BankSettings { delay_ms: 2_000 }
    }
}

impl BankSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Simulated email delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub enabled: bool,
    pub delay_ms: u64,
    pub from: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        EmailSettings {
            enabled: true,
            delay_ms: 1_000,
            from: "tickets@evently.app".to_string(),
        }
    }
}

impl EmailSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub payment: PaymentSettings,

    #[serde(default)]
    pub bank: BankSettings,

    #[serde(default)]
    pub email: EmailSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Settings for unit tests: in-memory database, no delays, no declines.
    pub fn for_tests() -> Self {
        AppConfig {
            database: DatabaseSettings {
                path: Some(PathBuf::from(evently_db::pool::IN_MEMORY_PATH)),
                seed_demo_data: false,
                stale_reservation_mins: 30,
            },
            payment: PaymentSettings {
                decline_rate_bps: 0,
                delay_ms: 0,
            },
            bank: BankSettings { delay_ms: 0 },
            email: EmailSettings {
                delay_ms: 0,
                ..EmailSettings::default()
            },
        }
    }

    /// Saves configuration to file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.payment.decline_rate_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "payment.decline_rate_bps must be at most 10000, got {}",
                self.payment.decline_rate_bps
            )));
        }

        if self.database.stale_reservation_mins == 0 {
            return Err(ConfigError::Invalid(
                "database.stale_reservation_mins must be greater than 0".into(),
            ));
        }

        if self.email.enabled && !self.email.from.contains('@') {
            return Err(ConfigError::Invalid(format!(
                "email.from is not an email address: {}",
                self.email.from
            )));
        }

        Ok(())
    }

    /// Database file, creating the data directory when the default is used.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("evently.db"))
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("EVENTLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(seed) = std::env::var("EVENTLY_SEED_DEMO_DATA") {
            match parse_bool(&seed) {
                Some(b) => self.database.seed_demo_data = b,
                None => warn!(value = %seed, "Invalid EVENTLY_SEED_DEMO_DATA"),
            }
        }

        // Percent, e.g. "10" or "2.5"
        if let Ok(rate) = std::env::var("EVENTLY_PAYMENT_DECLINE_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) if (0.0..=100.0).contains(&pct) => {
                    debug!(percent = pct, "Overriding decline rate from environment");
                    self.payment.decline_rate_bps = (pct * 100.0).round() as u32;
                }
                _ => warn!(value = %rate, "Invalid EVENTLY_PAYMENT_DECLINE_RATE"),
            }
        }

        if let Ok(delay) = std::env::var("EVENTLY_PAYMENT_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                self.payment.delay_ms = ms;
                self.bank.delay_ms = ms;
            }
        }

        if let Ok(enabled) = std::env::var("EVENTLY_EMAIL_ENABLED") {
            match parse_bool(&enabled) {
                Some(b) => self.email.enabled = b,
                None => warn!(value = %enabled, "Invalid EVENTLY_EMAIL_ENABLED"),
            }
        }

        if let Ok(delay) = std::env::var("EVENTLY_EMAIL_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                self.email.delay_ms = ms;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("app", "evently", "evently")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.database.seed_demo_data);
        assert_eq!(config.payment.decline_rate().percentage(), 10.0);
        assert_eq!(config.payment.delay(), Duration::from_millis(2_000));
        assert_eq!(config.email.delay(), Duration::from_millis(1_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [payment]
            decline_rate_bps = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.payment.decline_rate_bps, 0);
        assert_eq!(config.payment.delay_ms, 2_000);
        assert_eq!(config.email, EmailSettings::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.payment.decline_rate_bps = 10_001;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.email.from = "nobody".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("evently-config-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE_NAME);

        let mut config = AppConfig::for_tests();
        config.email.from = "box@example.com".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.email.from, "box@example.com");
        assert_eq!(loaded.payment.decline_rate_bps, 0);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("evently-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[payment\ndecline_rate_bps = ").unwrap();

        assert!(matches!(AppConfig::load(Some(path.clone())), Err(ConfigError::Parse(_))));
        assert_eq!(AppConfig::load_or_default(Some(path)), AppConfig::default());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
