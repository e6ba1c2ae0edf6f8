//! # Checkout Commands
//!
//! Quotes and purchases. A purchase never leaves a seat or coupon use held
//! without a ticket:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Purchase Flow                                        │
//! │                                                                         │
//! │  reserve ──► seat taken, coupon use taken, reservation pending          │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  net == 0 ? ──yes──────────────────────────┐                            │
//! │     │ no                                   │                            │
//! │     ▼                                      │                            │
//! │  charge card / bank transfer (total)       │                            │
//! │     │                  │                   │                            │
//! │   declined           approved              │                            │
//! │     │                  │                   ▼                            │
//! │  release ◄── error   commit ──► ticket + usage record                   │
//! │  (seat and use given back)         │                                    │
//! │                                    ▼                                    │
//! │                        booking confirmation (failure only logged)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ApiResult;
use crate::services::{BankTransferReceipt, PaymentInstructions, ServiceResult, SupportedBank};
use crate::state::{AppState, Session};
use evently_core::validation::{validate_email, validate_text};
use evently_core::{
    AppliedDiscount, AttendeeInfo, BankAccount, Event, FeeQuote, FeeSchedule, Money, Ticket,
};
use evently_db::{ReserveRequest, ReservedCheckout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn fee_schedule(&self) -> FeeSchedule {
        match self {
            PaymentMethod::Card => FeeSchedule::CARD,
            PaymentMethod::BankTransfer => FeeSchedule::BANK_TRANSFER,
        }
    }
}

/// Price breakdown for one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub event_id: String,
    pub method: PaymentMethod,
    pub ticket_price: Money,
    pub discount: Money,
    pub coupon: Option<AppliedDiscount>,
    /// Fees are charged on the discounted price.
    pub fees: FeeQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPurchaseRequest {
    pub event_id: String,
    pub coupon_code: Option<String>,
    pub attendee: AttendeeInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankPurchaseRequest {
    pub event_id: String,
    pub coupon_code: Option<String>,
    pub attendee: AttendeeInfo,
    pub account: BankAccount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub ticket: Ticket,
    pub charged: FeeQuote,
    pub discount: Money,
    pub coupon_code: Option<String>,
    /// Card transaction id or bank transfer id. `None` for free tickets.
    pub payment_reference: Option<String>,
    pub bank_receipt: Option<BankTransferReceipt>,
    pub email_sent: bool,
}

enum Payment<'a> {
    Card,
    Bank(&'a BankAccount),
}

impl Payment<'_> {
    fn method(&self) -> PaymentMethod {
        match self {
            Payment::Card => PaymentMethod::Card,
            Payment::Bank(_) => PaymentMethod::BankTransfer,
        }
    }
}

/// Prices a ticket without reserving anything.
pub async fn quote(
    state: &AppState,
    event_id: &str,
    coupon_code: Option<&str>,
    method: PaymentMethod,
) -> ApiResult<CheckoutQuote> {
    debug!(event_id = %event_id, coupon = ?coupon_code, ?method, "quote command");

    let event = state.db.events().get(event_id).await?;

    let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(
            state
                .db
                .coupons()
                .preview(code, &event.id, event.price(), Utc::now())
                .await?,
        ),
        None => None,
    };

    let discount = coupon.as_ref().map(|c| c.discount).unwrap_or(Money::zero());
    let net = event.price() - discount;

    Ok(CheckoutQuote {
        ticket_price: event.price(),
        event_id: event.id,
        method,
        discount,
        coupon,
        fees: price_with_fees(method, net),
    })
}

pub async fn purchase_with_card(
    state: &AppState,
    session: &Session,
    request: CardPurchaseRequest,
) -> ApiResult<PurchaseResponse> {
    debug!(event_id = %request.event_id, "purchase_with_card command");

    purchase(
        state,
        session,
        &request.event_id,
        request.coupon_code.as_deref(),
        &request.attendee,
        Payment::Card,
    )
    .await
}

pub async fn purchase_with_bank(
    state: &AppState,
    session: &Session,
    request: BankPurchaseRequest,
) -> ApiResult<PurchaseResponse> {
    debug!(
        event_id = %request.event_id,
        bank = %request.account.bank_name,
        "purchase_with_bank command"
    );

    purchase(
        state,
        session,
        &request.event_id,
        request.coupon_code.as_deref(),
        &request.attendee,
        Payment::Bank(&request.account),
    )
    .await
}

pub fn supported_banks(state: &AppState) -> &'static [SupportedBank] {
    state.services.bank.supported_banks()
}

/// Recipient details for paying an event by manual transfer.
pub async fn bank_instructions(
    state: &AppState,
    event_id: &str,
    coupon_code: Option<&str>,
) -> ApiResult<PaymentInstructions> {
    let quote = quote(state, event_id, coupon_code, PaymentMethod::BankTransfer).await?;
    let reference = transfer_reference(event_id);

    Ok(state.services.bank.instructions(quote.fees.total, &reference))
}

async fn purchase(
    state: &AppState,
    session: &Session,
    event_id: &str,
    coupon_code: Option<&str>,
    attendee: &AttendeeInfo,
    payment: Payment<'_>,
) -> ApiResult<PurchaseResponse> {
    let user = session.require_user()?;
    validate_attendee(attendee)?;

    let ReservedCheckout {
        reservation,
        event,
        applied,
    } = state
        .db
        .checkout()
        .reserve(&ReserveRequest {
            event_id: event_id.to_string(),
            user_id: user.id.clone(),
            coupon_code: coupon_code.map(str::to_string),
        })
        .await?;

    let net = reservation.net();
    let charged = price_with_fees(payment.method(), net);

    let outcome = if net.is_zero() {
        debug!(reservation_id = %reservation.id, "Free ticket, skipping payment");
        Ok(PaymentOutcome::default())
    } else {
        pay(state, &payment, charged.total, &transfer_reference(&reservation.id)).await
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            release_quietly(state, &reservation.id).await;
            return Err(err.into());
        }
    };

    let ticket = match state
        .db
        .checkout()
        .commit(&reservation.id, attendee, outcome.reference.as_deref())
        .await
    {
        Ok(ticket) => ticket,
        Err(err) => {
            error!(
                reservation_id = %reservation.id,
                payment_reference = ?outcome.reference,
                "Payment taken but ticket could not be issued: {}", err
            );
            release_quietly(state, &reservation.id).await;
            return Err(err.into());
        }
    };

    let email_sent = send_confirmation(state, &event, &ticket).await;

    info!(
        ticket_id = %ticket.id,
        event_id = %event.id,
        user_id = %user.id,
        total = %charged.total,
        "Ticket purchased"
    );

    Ok(PurchaseResponse {
        ticket,
        charged,
        discount: applied.as_ref().map(|a| a.discount).unwrap_or(Money::zero()),
        coupon_code: applied.map(|a| a.code),
        payment_reference: outcome.reference,
        bank_receipt: outcome.bank_receipt,
        email_sent,
    })
}

#[derive(Debug, Default)]
struct PaymentOutcome {
    reference: Option<String>,
    bank_receipt: Option<BankTransferReceipt>,
}

async fn pay(
    state: &AppState,
    payment: &Payment<'_>,
    amount: Money,
    reference: &str,
) -> ServiceResult<PaymentOutcome> {
    match payment {
        Payment::Card => {
            let charge = state.services.cards.charge(amount).await?;
            Ok(PaymentOutcome {
                reference: Some(charge.transaction_id),
                bank_receipt: None,
            })
        }
        Payment::Bank(account) => {
            let receipt = state.services.bank.transfer(account, amount, reference).await?;
            Ok(PaymentOutcome {
                reference: Some(receipt.transfer_id.clone()),
                bank_receipt: Some(receipt),
            })
        }
    }
}

async fn release_quietly(state: &AppState, reservation_id: &str) {
    if let Err(err) = state.db.checkout().release(reservation_id).await {
        error!(reservation_id = %reservation_id, "Failed to release reservation: {}", err);
    }
}

async fn send_confirmation(state: &AppState, event: &Event, ticket: &Ticket) -> bool {
    let mailer = &state.services.mailer;
    let message = mailer.booking_confirmation(event, ticket);

    match mailer.send(message).await {
        Ok(sent) => sent,
        Err(err) => {
            warn!(ticket_id = %ticket.id, "Booking confirmation not sent: {}", err);
            false
        }
    }
}

/// Free tickets carry no fees.
fn price_with_fees(method: PaymentMethod, net: Money) -> FeeQuote {
    if net.is_zero() {
        return FeeQuote {
            subtotal: net,
            fees: Money::zero(),
            total: net,
        };
    }
    method.fee_schedule().quote(net)
}

fn validate_attendee(attendee: &AttendeeInfo) -> ApiResult<()> {
    validate_text("first_name", &attendee.first_name, 50)?;
    validate_text("last_name", &attendee.last_name, 50)?;
    validate_email(&attendee.email)?;
    Ok(())
}

/// `EVT-` plus the first eight characters of an id, upper-cased.
fn transfer_reference(id: &str) -> String {
    let short: String = id.chars().filter(|c| *c != '-').take(8).collect();
    format!("EVT-{}", short.to_uppercase())
}
