use crate::error::{FieldErrors, PaymentError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Store-assigned identifier of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(u64);

impl PaymentId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an order owned by the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a positive monetary amount for a payment.
///
/// The only way to build one is through [`Amount::new`], so a payment can never
/// carry a zero or negative amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            let mut errors = FieldErrors::new();
            errors.insert("amount".to_string(), "Amount must be positive".to_string());
            Err(PaymentError::Validation(errors))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    Crypto,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "CREDIT_CARD",
            Self::DebitCard => "DEBIT_CARD",
            Self::Paypal => "PAYPAL",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Crypto => "CRYPTO",
        }
    }

    /// Card-based methods are the only ones that carry a card number and CVV.
    pub fn is_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// The lifecycle transition table. Anything not listed here is rejected.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Completed, Refunded)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid payment transition from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

impl From<TransitionError> for PaymentError {
    fn from(err: TransitionError) -> Self {
        PaymentError::Internal(err.to_string())
    }
}

/// A payment that has not been persisted yet and therefore has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    order_id: OrderId,
    amount: Amount,
    method: PaymentMethod,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NewPayment {
    /// Creates a draft in `PENDING` state.
    pub fn new(
        order_id: OrderId,
        amount: Amount,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the draft to `PROCESSING`; done before it is first persisted.
    pub fn begin_processing(self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        check(self.status, PaymentStatus::Processing)?;
        Ok(Self {
            status: PaymentStatus::Processing,
            updated_at: later(self.updated_at, now),
            ..self
        })
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Binds the draft to the id the store allocated for it.
    pub fn assign_id(self, id: PaymentId) -> Payment {
        Payment {
            id,
            order_id: self.order_id,
            amount: self.amount,
            method: self.method,
            transaction_id: None,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Immutable snapshot of a persisted payment.
///
/// State changes consume the snapshot and return the next one; the store then
/// replaces the stored record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    amount: Amount,
    method: PaymentMethod,
    transaction_id: Option<String>,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Gateway authorized the charge.
    pub fn complete(
        self,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let next = self.transition(PaymentStatus::Completed, now)?;
        Ok(Self {
            transaction_id: Some(transaction_id),
            ..next
        })
    }

    /// Gateway declined or errored.
    pub fn fail(self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.transition(PaymentStatus::Failed, now)
    }

    /// The gateway never answered within the deadline.
    pub fn cancel(self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.transition(PaymentStatus::Cancelled, now)
    }

    /// Gateway accepted the refund. The transaction id is kept.
    pub fn refund(self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.transition(PaymentStatus::Refunded, now)
    }

    fn transition(self, to: PaymentStatus, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        check(self.status, to)?;
        Ok(Self {
            status: to,
            updated_at: later(self.updated_at, now),
            ..self
        })
    }
}

fn check(from: PaymentStatus, to: PaymentStatus) -> Result<(), TransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError::InvalidTransition { from, to })
    }
}

// updated_at never moves backwards, even if the wall clock does.
fn later(current: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    current.max(now)
}
