use crate::domain::events::PaymentEvent;
use crate::domain::ports::{NotificationSinkRef, OrderSyncRef};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Sending half handed to the engine. Publishing never waits.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    tx: mpsc::Sender<PaymentEvent>,
}

impl EventPublisher {
    /// Queues the event for delivery. Returns `false` if it had to be dropped
    /// because the buffer is full or the dispatcher is gone.
    pub fn publish(&self, event: PaymentEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    kind = event.kind(),
                    order_id = %event.order_id(),
                    "Event buffer full, dropping lifecycle event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    kind = event.kind(),
                    order_id = %event.order_id(),
                    "Event dispatcher stopped, dropping lifecycle event"
                );
                false
            }
        }
    }
}

/// Background fan-out of lifecycle events to the notification sink and the
/// order-sync client.
///
/// Runs as its own task behind a bounded channel so a slow or failing
/// collaborator never holds up a payment transition.
pub struct EventDispatcher {
    handle: JoinHandle<()>,
}

impl EventDispatcher {
    /// Spawns the delivery task on the current runtime.
    pub fn spawn(
        notifications: NotificationSinkRef,
        order_sync: OrderSyncRef,
        buffer: usize,
    ) -> (EventPublisher, Self) {
        let (tx, mut rx) = mpsc::channel(buffer.max(1));
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                deliver(&notifications, &order_sync, event).await;
            }
            debug!("Event dispatcher drained");
        });
        (EventPublisher { tx }, Self { handle })
    }

    /// Waits until every publisher is dropped and all queued events are delivered.
    pub async fn shutdown(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "Event dispatcher task failed");
        }
    }
}

async fn deliver(
    notifications: &NotificationSinkRef,
    order_sync: &OrderSyncRef,
    event: PaymentEvent,
) {
    match event {
        PaymentEvent::Confirmed(payment) => {
            let order_id = payment.order_id();
            if let Err(e) = notifications.payment_confirmed(&payment).await {
                error!(%order_id, error = %e, "Failed to send payment confirmation");
            }
            if let Err(e) = order_sync.order_paid(order_id, payment.id()).await {
                error!(%order_id, error = %e, "Failed to update order status");
            }
        }
        PaymentEvent::Failed {
            payment_id,
            order_id,
            reason,
        } => {
            if let Err(e) = notifications.payment_failed(order_id, &reason).await {
                error!(
                    %order_id,
                    %payment_id,
                    error = %e,
                    "Failed to send payment failure notification"
                );
            }
        }
        PaymentEvent::Refunded(payment) => {
            let order_id = payment.order_id();
            if let Err(e) = notifications.refund_confirmed(&payment).await {
                error!(%order_id, error = %e, "Failed to send refund confirmation");
            }
            if let Err(e) = order_sync.order_refunded(order_id, payment.id()).await {
                error!(
                    %order_id,
                    error = %e,
                    "Failed to update order status after refund"
                );
            }
        }
    }
}
