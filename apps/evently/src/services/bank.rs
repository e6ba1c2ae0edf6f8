//! # Bank Transfer Service
//!
//! Simulated ACH/wire processor, plus the static data the checkout shows
//! for manual transfers (supported banks, recipient details).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ServiceError, ServiceResult};
use evently_core::ticket::generate_bank_transfer_id;
use evently_core::validation::{validate_bank_account, validate_payment_amount};
use evently_core::{BankAccount, Money};

/// Shown to the buyer after a transfer is accepted.
pub const CLEARING_ESTIMATE: &str = "1-3 business days";

pub const RECIPIENT_NAME: &str = "Evently Events Inc.";
pub const RECIPIENT_ACCOUNT: &str = "****-****-****-1234";
pub const RECIPIENT_ROUTING: &str = "021000021";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedBank {
    pub name: &'static str,
    pub code: &'static str,
}

const SUPPORTED_BANKS: &[SupportedBank] = &[
    SupportedBank { name: "Chase Bank", code: "CHASE" },
    SupportedBank { name: "Bank of America", code: "BOA" },
    SupportedBank { name: "Wells Fargo", code: "WF" },
    SupportedBank { name: "Citibank", code: "CITI" },
    SupportedBank { name: "US Bank", code: "USB" },
    SupportedBank { name: "PNC Bank", code: "PNC" },
    SupportedBank { name: "Capital One", code: "CAPO" },
    SupportedBank { name: "TD Bank", code: "TD" },
    SupportedBank { name: "Other", code: "OTHER" },
];

/// Accepted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransferReceipt {
    /// `BT-<millis>-<suffix>`
    pub transfer_id: String,
    pub amount: Money,
    pub masked_account: String,
    pub estimated_clearing: String,
}

/// Details for paying by manual transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub recipient_name: String,
    pub recipient_account: String,
    pub routing_number: String,
    pub amount: Money,
    pub reference: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BankTransferService {
    delay: Duration,
}

impl BankTransferService {
    pub fn new(delay: Duration) -> Self {
        BankTransferService { delay }
    }

    pub fn supported_banks(&self) -> &'static [SupportedBank] {
        SUPPORTED_BANKS
    }

    /// Validates the account and amount, then accepts the transfer.
    pub async fn transfer(
        &self,
        account: &BankAccount,
        amount: Money,
        reference: &str,
    ) -> ServiceResult<BankTransferReceipt> {
        debug!(
            bank = %account.bank_name,
            account = %account.masked_number(),
            amount = %amount,
            reference = %reference,
            "Processing bank transfer"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        validate_bank_account(account).map_err(|err| {
            warn!(reason = %err, "Bank transfer rejected");
            ServiceError::TransferRejected("Invalid bank account information".to_string())
        })?;

        validate_payment_amount(amount.cents()).map_err(|_| {
            warn!(amount = %amount, "Bank transfer rejected");
            ServiceError::TransferRejected("Invalid transfer amount".to_string())
        })?;

        let receipt = BankTransferReceipt {
            transfer_id: generate_bank_transfer_id(chrono::Utc::now()),
            amount,
            masked_account: account.masked_number(),
            estimated_clearing: CLEARING_ESTIMATE.to_string(),
        };

        info!(transfer_id = %receipt.transfer_id, amount = %amount, "Bank transfer accepted");
        Ok(receipt)
    }

    /// Recipient details and steps for a manual transfer.
    pub fn instructions(&self, amount: Money, reference: &str) -> PaymentInstructions {
        PaymentInstructions {
            recipient_name: RECIPIENT_NAME.to_string(),
            recipient_account: RECIPIENT_ACCOUNT.to_string(),
            routing_number: RECIPIENT_ROUTING.to_string(),
            amount,
            reference: reference.to_string(),
            steps: vec![
                "Log into your online banking or visit your bank branch".to_string(),
                "Set up a new wire transfer or ACH payment".to_string(),
                "Use the recipient information provided above".to_string(),
                "Include the reference number in the memo/description field".to_string(),
                "Submit the transfer and save the confirmation".to_string(),
                format!(
                    "Your event registration will be confirmed once payment clears ({CLEARING_ESTIMATE})"
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evently_core::AccountType;

    fn account(number: &str, routing: &str) -> BankAccount {
        BankAccount {
            account_number: number.to_string(),
            routing_number: routing.to_string(),
            account_type: AccountType::Checking,
            bank_name: "Chase Bank".to_string(),
        }
    }

    #[tokio::test]
    async fn test_accepted_transfer() {
        let service = BankTransferService::new(Duration::ZERO);
        let receipt = service
            .transfer(&account("12345678", "021000021"), Money::from_cents(10_150), "EVT-1")
            .await
            .unwrap();

        assert!(receipt.transfer_id.starts_with("BT-"));
        assert_eq!(receipt.estimated_clearing, "1-3 business days");
        assert!(receipt.masked_account.ends_with("5678"));
    }

    #[tokio::test]
    async fn test_rejected_transfers() {
        let service = BankTransferService::new(Duration::ZERO);

        let err = service
            .transfer(&account("1234", "021000021"), Money::from_cents(100), "r")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bank transfer rejected: Invalid bank account information");

        let err = service
            .transfer(&account("12345678", "02100002X"), Money::from_cents(100), "r")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::TransferRejected(_)));

        let err = service
            .transfer(&account("12345678", "021000021"), Money::zero(), "r")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bank transfer rejected: Invalid transfer amount");
    }

    #[test]
    fn test_supported_banks_and_instructions() {
        let service = BankTransferService::new(Duration::ZERO);
        let banks = service.supported_banks();
        assert_eq!(banks.len(), 9);
        assert_eq!(banks[0].code, "CHASE");
        assert_eq!(banks[8].name, "Other");

        let instructions = service.instructions(Money::from_cents(10_150), "EVT-42");
        assert_eq!(instructions.recipient_name, "Evently Events Inc.");
        assert_eq!(instructions.reference, "EVT-42");
        assert_eq!(instructions.steps.len(), 6);
        assert!(instructions.steps[5].ends_with("(1-3 business days)"));
    }
}
