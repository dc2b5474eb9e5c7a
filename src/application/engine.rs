use crate::application::dispatcher::EventPublisher;
use crate::application::locks::PaymentLocks;
use crate::domain::events::PaymentEvent;
use crate::domain::payment::{
    Amount, NewPayment, OrderId, Payment, PaymentId, PaymentMethod, PaymentStatus,
};
use crate::domain::ports::{
    AuthorizationRequest, GatewayError, GatewayResult, PaymentGatewayRef, PaymentStoreBox,
};
use crate::error::{PaymentError, Result};
use crate::masking::mask_card_number;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// A validated request to charge an order.
#[derive(Clone, PartialEq)]
pub struct ProcessPayment {
    pub order_id: OrderId,
    pub amount: Amount,
    pub method: PaymentMethod,
    /// Only used for masked diagnostics; never stored or forwarded.
    pub card_number: Option<String>,
    /// Caller-supplied token identifying retries of the same request.
    pub idempotency_key: Option<String>,
}

impl std::fmt::Debug for ProcessPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPayment")
            .field("order_id", &self.order_id)
            .field("amount", &self.amount)
            .field("method", &self.method)
            .field(
                "card_number",
                &self.card_number.as_deref().map(mask_card_number),
            )
            .field("idempotency_key", &self.idempotency_key)
            .finish()
    }
}

/// The payment lifecycle engine.
///
/// `PaymentEngine` owns the state machine: it creates payments, drives them
/// through the gateway, persists every transition and publishes lifecycle
/// events. It keeps no per-payment state between calls; transitions on the
/// same payment are serialized through [`PaymentLocks`].
pub struct PaymentEngine {
    store: PaymentStoreBox,
    gateway: PaymentGatewayRef,
    events: EventPublisher,
    locks: PaymentLocks,
    gateway_timeout: Duration,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence for payment snapshots.
    /// * `gateway` - The external payment processor.
    /// * `events` - Where lifecycle events are published.
    pub fn new(store: PaymentStoreBox, gateway: PaymentGatewayRef, events: EventPublisher) -> Self {
        Self {
            store,
            gateway,
            events,
            locks: PaymentLocks::new(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Deadline applied to every gateway call.
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Charges an order.
    ///
    /// The payment is persisted in `PROCESSING` before the gateway is called,
    /// and the gateway is called exactly once. Any gateway failure is recorded
    /// on the payment and then returned as [`PaymentError::Processing`].
    #[instrument(
        skip(self, request),
        fields(
            order_id = %request.order_id,
            method = %request.method,
            idempotency_key = request.idempotency_key.as_deref()
        )
    )]
    pub async fn process(&self, request: ProcessPayment) -> Result<Payment> {
        info!(amount = %request.amount, "Processing payment");
        let card_number = request.card_number.as_deref();
        if let Some(card_number) = card_number.filter(|_| request.method.is_card()) {
            debug!(card = %mask_card_number(card_number), "Processing with card");
        }

        let now = Utc::now();
        let draft = NewPayment::new(request.order_id, request.amount, request.method, now)
            .begin_processing(now)?;
        let id = self.store.insert(draft).await?.id();
        let _guard = self.locks.acquire(id).await;

        // A delete may have landed between insert and lock.
        let Some(payment) = self.store.find_by_id(id).await? else {
            warn!(payment_id = %id, "Payment removed before authorization");
            return Err(PaymentError::NotFound(id));
        };

        let authorization = AuthorizationRequest {
            payment_id: payment.id(),
            order_id: payment.order_id(),
            amount: payment.amount(),
            method: payment.method(),
            idempotency_key: request.idempotency_key,
        };

        match self
            .with_deadline(self.gateway.authorize(&authorization))
            .await
        {
            Ok(transaction_id) => {
                let payment = payment.complete(transaction_id, Utc::now())?;
                let payment = self.store.save(payment).await?;
                let event = PaymentEvent::Confirmed(payment.clone());
                self.events.publish(event);
                info!(payment_id = %payment.id(), "Payment completed successfully");
                Ok(payment)
            }
            Err(e) => {
                error!(payment_id = %payment.id(), error = %e, "Payment processing failed");
                let payment = match e {
                    GatewayError::Timeout(_) => payment.cancel(Utc::now())?,
                    GatewayError::Declined(_) | GatewayError::Transient(_) => {
                        payment.fail(Utc::now())?
                    }
                };
                let payment = self.store.save(payment).await?;
                let reason = e.to_string();
                self.events.publish(PaymentEvent::Failed {
                    payment_id: payment.id(),
                    order_id: payment.order_id(),
                    reason: reason.clone(),
                });
                Err(PaymentError::Processing {
                    order_id: payment.order_id(),
                    reason,
                })
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: PaymentId) -> Result<Payment> {
        info!("Retrieving payment");
        self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!("Payment not found");
            PaymentError::NotFound(id)
        })
    }

    /// All payments for an order, oldest first. Empty if there are none.
    #[instrument(skip(self))]
    pub async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        info!("Retrieving payments for order");
        let payments = self.store.find_by_order_id(order_id).await?;
        info!(count = payments.len(), "Found payments for order");
        Ok(payments)
    }

    /// Refunds a completed payment in full.
    ///
    /// Holds the payment's lock across load, gateway call and save, so two
    /// concurrent refunds cannot both reach the gateway. A declined refund
    /// leaves the payment `COMPLETED`.
    #[instrument(skip(self))]
    pub async fn refund(&self, id: PaymentId) -> Result<Payment> {
        info!("Processing refund");
        let _guard = self.locks.acquire(id).await;

        let payment = self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!("Payment not found for refund");
            PaymentError::NotFound(id)
        })?;

        if payment.status() != PaymentStatus::Completed {
            warn!(status = %payment.status(), "Cannot refund payment");
            return Err(PaymentError::Precondition {
                id,
                status: payment.status(),
            });
        }

        let Some(transaction_id) = payment.transaction_id().map(str::to_owned) else {
            error!("Completed payment has no transaction id");
            return Err(PaymentError::Internal(format!(
                "completed payment {id} has no transaction id"
            )));
        };

        match self
            .with_deadline(self.gateway.refund(&transaction_id))
            .await
        {
            Ok(refund_id) => {
                let payment = payment.refund(Utc::now())?;
                let payment = self.store.save(payment).await?;
                let event = PaymentEvent::Refunded(payment.clone());
                self.events.publish(event);
                info!(%refund_id, "Refund processed successfully");
                Ok(payment)
            }
            Err(e) => {
                error!(error = %e, "Refund processing failed");
                Err(PaymentError::Processing {
                    order_id: payment.order_id(),
                    reason: format!("Failed to process refund: {e}"),
                })
            }
        }
    }

    /// Administrative hard delete, regardless of status.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PaymentId) -> Result<()> {
        info!("Deleting payment");
        let _guard = self.locks.acquire(id).await;

        if !self.store.exists_by_id(id).await? {
            warn!("Cannot delete - payment not found");
            return Err(PaymentError::NotFound(id));
        }

        self.store.delete_by_id(id).await?;
        info!("Payment deleted successfully");
        Ok(())
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        tokio::time::timeout(self.gateway_timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.gateway_timeout)))
    }
}
