use super::payment::{Amount, NewPayment, OrderId, Payment, PaymentId, PaymentMethod};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Persistence for payment snapshots.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// First save of a draft; the store assigns the id.
    async fn insert(&self, payment: NewPayment) -> Result<Payment>;
    /// Replaces an existing snapshot. Fails with `NotFound` if the id is gone.
    async fn save(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>>;
    /// Payments for an order, in creation order.
    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>>;
    async fn exists_by_id(&self, id: PaymentId) -> Result<bool>;
    async fn delete_by_id(&self, id: PaymentId) -> Result<()>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type PaymentStoreFactory = Box<dyn Fn() -> PaymentStoreBox + Send + Sync>;

/// What the gateway needs to authorize a charge. Card data never reaches it
/// from here; a real integration would receive a tokenized instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationRequest {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: Amount,
    pub method: PaymentMethod,
    pub idempotency_key: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    Declined(String),
    #[error("{0}")]
    Transient(String),
    #[error("Payment gateway did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the gateway transaction id on success.
    async fn authorize(&self, request: &AuthorizationRequest) -> GatewayResult<String>;
    /// Returns the refund id on success.
    async fn refund(&self, transaction_id: &str) -> GatewayResult<String>;
}

pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;

/// Failure reported by a side-effect collaborator. Always logged, never surfaced.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SinkError(pub String);

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn payment_confirmed(&self, payment: &Payment) -> std::result::Result<(), SinkError>;
    async fn payment_failed(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> std::result::Result<(), SinkError>;
    async fn refund_confirmed(&self, payment: &Payment) -> std::result::Result<(), SinkError>;
}

#[async_trait]
pub trait OrderSync: Send + Sync {
    async fn order_paid(
        &self,
        order_id: OrderId,
        payment_id: PaymentId,
    ) -> std::result::Result<(), SinkError>;
    async fn order_refunded(
        &self,
        order_id: OrderId,
        payment_id: PaymentId,
    ) -> std::result::Result<(), SinkError>;
}

pub type NotificationSinkRef = Arc<dyn NotificationSink>;
pub type OrderSyncRef = Arc<dyn OrderSync>;
