use crate::domain::payment::{NewPayment, OrderId, Payment, PaymentId};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    payments: BTreeMap<PaymentId, Payment>,
    last_id: u64,
}

/// A thread-safe in-memory store for payments.
///
/// Ids are allocated from a monotonically increasing counter and records are
/// kept in a `BTreeMap`, so iteration order is creation order. All writes go
/// through the same `RwLock`, which also serializes saves for the same id.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<Payment> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let payment = payment.assign_id(PaymentId::new(inner.last_id));
        inner.payments.insert(payment.id(), payment.clone());
        Ok(payment)
    }

    async fn save(&self, payment: Payment) -> Result<Payment> {
        let mut inner = self.inner.write().await;
        match inner.payments.get_mut(&payment.id()) {
            Some(slot) => {
                *slot = payment.clone();
                Ok(payment)
            }
            None => Err(PaymentError::NotFound(payment.id())),
        }
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id).cloned())
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .values()
            .filter(|payment| payment.order_id() == order_id)
            .cloned()
            .collect())
    }

    async fn exists_by_id(&self, id: PaymentId) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.payments.contains_key(&id))
    }

    async fn delete_by_id(&self, id: PaymentId) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.payments.remove(&id);
        Ok(())
    }
}
