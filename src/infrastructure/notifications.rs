use crate::domain::payment::{OrderId, Payment, PaymentId};
use crate::domain::ports::{NotificationSink, OrderSync, SinkError};
use async_trait::async_trait;
use tracing::info;

/// Notification sink that only records what it would have sent.
///
/// Stands in for an email or messaging integration.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn payment_confirmed(&self, payment: &Payment) -> Result<(), SinkError> {
        info!(
            order_id = %payment.order_id(),
            transaction_id = payment.transaction_id().unwrap_or_default(),
            "Sending payment confirmation"
        );
        Ok(())
    }

    async fn payment_failed(&self, order_id: OrderId, reason: &str) -> Result<(), SinkError> {
        info!(%order_id, reason, "Sending payment failure notification");
        Ok(())
    }

    async fn refund_confirmed(&self, payment: &Payment) -> Result<(), SinkError> {
        info!(
            order_id = %payment.order_id(),
            transaction_id = payment.transaction_id().unwrap_or_default(),
            "Sending refund confirmation"
        );
        Ok(())
    }
}

/// Order-service client that logs the status update it would post.
#[derive(Debug, Clone)]
pub struct LoggingOrderSync {
    base_url: String,
}

impl LoggingOrderSync {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint the status update for `order_id` would be posted to.
    pub fn status_url(&self, order_id: OrderId) -> String {
        format!("{}/{}/status", self.base_url, order_id)
    }
}

#[async_trait]
impl OrderSync for LoggingOrderSync {
    async fn order_paid(&self, order_id: OrderId, payment_id: PaymentId) -> Result<(), SinkError> {
        info!(
            %order_id,
            %payment_id,
            url = %self.status_url(order_id),
            status = "PAID",
            "Updating order status after payment"
        );
        Ok(())
    }

    async fn order_refunded(
        &self,
        order_id: OrderId,
        payment_id: PaymentId,
    ) -> Result<(), SinkError> {
        info!(
            %order_id,
            %payment_id,
            url = %self.status_url(order_id),
            status = "REFUNDED",
            "Updating order status after refund"
        );
        Ok(())
    }
}
