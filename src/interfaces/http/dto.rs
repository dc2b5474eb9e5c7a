use crate::application::engine::ProcessPayment;
use crate::domain::payment::{Amount, OrderId, Payment, PaymentMethod, PaymentStatus};
use crate::error::{FieldErrors, PaymentError};
use crate::masking::{mask_card_number, mask_cvv, mask_email};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/payments`.
///
/// Required fields are optional here so that a missing field is reported in
/// the field-error map instead of as a deserialization failure.
#[derive(Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: Option<u64>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub card_number: Option<String>,
    pub card_holder_name: Option<String>,
    pub expiry_date: Option<String>,
    pub cvv: Option<String>,
    pub paypal_email: Option<String>,
}

impl PaymentRequest {
    /// Checks required fields and turns the request into an engine command.
    ///
    /// Only the card number travels on, and only for masked diagnostics.
    pub fn validate(
        self,
        idempotency_key: Option<String>,
    ) -> Result<ProcessPayment, PaymentError> {
        let mut errors = FieldErrors::new();

        if self.order_id.is_none() {
            errors.insert("orderId".to_string(), "Order ID cannot be null".to_string());
        }
        let amount = match self.amount {
            None => {
                errors.insert("amount".to_string(), "Amount cannot be null".to_string());
                None
            }
            Some(value) => match Amount::new(value) {
                Ok(amount) => Some(amount),
                Err(_) => {
                    errors.insert("amount".to_string(), "Amount must be positive".to_string());
                    None
                }
            },
        };
        if self.payment_method.is_none() {
            errors.insert(
                "paymentMethod".to_string(),
                "Payment method cannot be null".to_string(),
            );
        }

        match (self.order_id, amount, self.payment_method) {
            (Some(order_id), Some(amount), Some(method)) => Ok(ProcessPayment {
                order_id: OrderId::new(order_id),
                amount,
                method,
                card_number: self.card_number,
                idempotency_key,
            }),
            _ => Err(PaymentError::Validation(errors)),
        }
    }
}

impl fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("order_id", &self.order_id)
            .field("amount", &self.amount)
            .field("payment_method", &self.payment_method)
            .field(
                "card_number",
                &self.card_number.as_deref().map(mask_card_number),
            )
            .field(
                "card_holder_name",
                &self.card_holder_name.as_deref().map(hidden),
            )
            .field("expiry_date", &self.expiry_date.as_deref().map(hidden))
            .field("cvv", &self.cvv.as_deref().map(mask_cvv))
            .field(
                "paypal_email",
                &self.paypal_email.as_deref().map(mask_email),
            )
            .finish()
    }
}

fn hidden(_value: &str) -> &'static str {
    "***"
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: u64,
    pub order_id: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id().value(),
            order_id: payment.order_id().value(),
            amount: payment.amount().value(),
            transaction_id: payment.transaction_id().map(str::to_owned),
            payment_method: payment.method(),
            status: payment.status(),
            created_at: payment.created_at(),
            updated_at: payment.updated_at(),
        }
    }
}
