use crate::domain::payment::{OrderId, PaymentId, PaymentStatus};
use std::collections::BTreeMap;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Field name to message, as reported back to API callers.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment not found with ID: {0}")]
    NotFound(PaymentId),

    #[error("Only completed payments can be refunded. Current status: {status}")]
    Precondition {
        id: PaymentId,
        status: PaymentStatus,
    },

    #[error("{reason}")]
    Processing { order_id: OrderId, reason: String },

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    /// Whether the error is the caller's fault and safe to echo back verbatim.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::storage(err)
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err)
    }
}
