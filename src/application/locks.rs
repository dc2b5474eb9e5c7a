use crate::domain::payment::PaymentId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<PaymentId, Arc<AsyncMutex<()>>>>>;

/// Per-payment mutual exclusion.
///
/// One async mutex per payment id, created on demand and dropped from the
/// table once the last holder or waiter lets go, so the table only ever holds
/// ids with a transition in flight.
#[derive(Clone, Default)]
pub struct PaymentLocks {
    table: LockTable,
}

/// Held for the duration of a transition on one payment.
pub struct PaymentLockGuard {
    id: PaymentId,
    table: LockTable,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PaymentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: PaymentId) -> PaymentLockGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = lock.clone().lock_owned().await;
        PaymentLockGuard {
            id,
            table: self.table.clone(),
            lock,
            guard: Some(guard),
        }
    }

    /// Number of payments with a lock currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PaymentLockGuard {
    pub fn payment_id(&self) -> PaymentId {
        self.id
    }
}

impl Drop for PaymentLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Two references left means only the table and this guard know the lock.
        if Arc::strong_count(&self.lock) == 2
            && table
                .get(&self.id)
                .is_some_and(|existing| Arc::ptr_eq(existing, &self.lock))
        {
            table.remove(&self.id);
        }
    }
}
