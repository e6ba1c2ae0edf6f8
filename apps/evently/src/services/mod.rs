//! # Simulated External Services
//!
//! Stand-ins for the card processor, bank transfer processor and mail
//! server. Each one awaits a configurable delay so callers see realistic
//! latency, and logs what a real integration would send.
//!
//! ```text
//! services/
//! ├── mod.rs      ◄─── Services bundle, ServiceError
//! ├── payment.rs  ◄─── CardGateway (random declines)
//! ├── bank.rs     ◄─── BankTransferService (validation, instructions)
//! └── email.rs    ◄─── Mailer (booking confirmations with QR attachment)
//! ```

pub mod bank;
pub mod email;
pub mod payment;

use thiserror::Error;

use crate::state::AppConfig;
use evently_core::ValidationError;

pub use bank::{BankTransferReceipt, BankTransferService, PaymentInstructions, SupportedBank};
pub use email::{Attachment, EmailMessage, Mailer};
pub use payment::{CardCharge, CardGateway};

/// Failures reported by the simulated services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Payment declined. Please check your card details.")]
    CardDeclined,

    #[error("Bank transfer rejected: {0}")]
    TransferRejected(String),

    #[error("Email delivery failed: {0}")]
    EmailFailed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// All simulated services, built from one config.
#[derive(Debug)]
pub struct Services {
    pub cards: CardGateway,
    pub bank: BankTransferService,
    pub mailer: Mailer,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Self {
        Services {
            cards: CardGateway::new(config.payment.decline_rate(), config.payment.delay()),
            bank: BankTransferService::new(config.bank.delay()),
            mailer: Mailer::new(
                config.email.enabled,
                config.email.from.clone(),
                config.email.delay(),
            ),
        }
    }
}
