use crate::domain::payment::{NewPayment, OrderId, Payment, PaymentId};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Column Family for storing payment snapshots, keyed by id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family indexing payments by order: `order_id ++ payment_id -> ()`.
pub const CF_ORDER_INDEX: &str = "order_index";
/// Column Family for bookkeeping such as the id counter.
pub const CF_META: &str = "meta";

const LAST_ID_KEY: &[u8] = b"last_id";

/// A persistent store implementation using RocksDB.
///
/// Keys are big-endian so that iterating a column family yields records in id
/// order, which is creation order. Writes that touch more than one column family
/// go through a `WriteBatch` so a payment and its index entry never diverge.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBPaymentStore {
    db: Arc<DB>,
    writes: Arc<Mutex<()>>,
}

impl RocksDBPaymentStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_PAYMENTS, CF_ORDER_INDEX, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            writes: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::Internal(format!("{name} column family not found")))
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.writes
            .lock()
            .map_err(|_| PaymentError::Internal("RocksDB write lock poisoned".to_string()))
    }

    fn read(&self, id: PaymentId) -> Result<Option<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_pinned_cf(cf, id.value().to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn last_id(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_pinned_cf(cf, LAST_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    PaymentError::Internal("corrupt id counter in meta column family".to_string())
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

fn index_key(order_id: OrderId, id: PaymentId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&order_id.value().to_be_bytes());
    key[8..].copy_from_slice(&id.value().to_be_bytes());
    key
}

#[async_trait]
impl PaymentStore for RocksDBPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<Payment> {
        let _guard = self.write_guard()?;
        let id = PaymentId::new(self.last_id()? + 1);
        let payment = payment.assign_id(id);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_PAYMENTS)?,
            id.value().to_be_bytes(),
            serde_json::to_vec(&payment)?,
        );
        batch.put_cf(self.cf(CF_ORDER_INDEX)?, index_key(payment.order_id(), id), b"");
        batch.put_cf(self.cf(CF_META)?, LAST_ID_KEY, id.value().to_be_bytes());
        self.db.write(batch)?;

        Ok(payment)
    }

    async fn save(&self, payment: Payment) -> Result<Payment> {
        let _guard = self.write_guard()?;
        if self.read(payment.id())?.is_none() {
            return Err(PaymentError::NotFound(payment.id()));
        }

        self.db.put_cf(
            self.cf(CF_PAYMENTS)?,
            payment.id().value().to_be_bytes(),
            serde_json::to_vec(&payment)?,
        )?;

        Ok(payment)
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.read(id)
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let prefix = order_id.value().to_be_bytes();
        let iter = self.db.iterator_cf(
            self.cf(CF_ORDER_INDEX)?,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut payments = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let raw: [u8; 8] = key[8..].try_into().map_err(|_| {
                PaymentError::Internal("corrupt key in order index".to_string())
            })?;
            // Index entries are removed together with the payment, but a
            // missing record is skipped rather than failing the whole query.
            if let Some(payment) = self.read(PaymentId::new(u64::from_be_bytes(raw)))? {
                payments.push(payment);
            }
        }

        Ok(payments)
    }

    async fn exists_by_id(&self, id: PaymentId) -> Result<bool> {
        let cf = self.cf(CF_PAYMENTS)?;
        // Just check if the key exists without deserializing the value
        let value = self.db.get_pinned_cf(cf, id.value().to_be_bytes())?;
        Ok(value.is_some())
    }

    async fn delete_by_id(&self, id: PaymentId) -> Result<()> {
        let _guard = self.write_guard()?;
        let Some(payment) = self.read(id)? else {
            return Ok(());
        };

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_PAYMENTS)?, id.value().to_be_bytes());
        batch.delete_cf(self.cf(CF_ORDER_INDEX)?, index_key(payment.order_id(), id));
        self.db.write(batch)?;

        Ok(())
    }
}
