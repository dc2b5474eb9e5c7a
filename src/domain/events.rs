use super::payment::{OrderId, Payment, PaymentId};

/// Lifecycle events published by the engine after a transition is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    /// The payment reached `COMPLETED`.
    Confirmed(Payment),
    /// The payment reached `FAILED` or `CANCELLED`.
    Failed {
        payment_id: PaymentId,
        order_id: OrderId,
        reason: String,
    },
    /// The payment reached `REFUNDED`.
    Refunded(Payment),
}

impl PaymentEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Confirmed(payment) | Self::Refunded(payment) => payment.order_id(),
            Self::Failed { order_id, .. } => *order_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Confirmed(_) => "confirmed",
            Self::Failed { .. } => "failed",
            Self::Refunded(_) => "refunded",
        }
    }
}
