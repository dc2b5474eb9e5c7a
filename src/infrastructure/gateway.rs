//! Simulated payment gateway.
//!
//! Stands in for a real processor: every call sleeps for a configurable latency
//! and then answers according to an [`OutcomeSource`]. Production wiring uses
//! [`RandomOutcomes`]; tests inject [`FixedOutcome`] or [`ScriptedOutcomes`] to
//! get deterministic sequences.

use crate::domain::ports::{AuthorizationRequest, GatewayError, GatewayResult, PaymentGateway};
use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_AUTHORIZE_SUCCESS_RATE: f64 = 0.9;
pub const DEFAULT_REFUND_SUCCESS_RATE: f64 = 0.95;
pub const DEFAULT_AUTHORIZE_LATENCY: Duration = Duration::from_millis(1000);
pub const DEFAULT_REFUND_LATENCY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOperation {
    Authorize,
    Refund,
}

/// The answer the simulated gateway gives to a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Approve,
    Decline,
    Error,
    /// Never answers; only useful together with a caller-side deadline.
    Hang,
}

pub trait OutcomeSource: Send + Sync {
    fn next_outcome(&self, operation: GatewayOperation) -> Outcome;
}

/// Independent draws per call, as a real processor would behave under load.
#[derive(Debug, Clone, Copy)]
pub struct RandomOutcomes {
    authorize_success_rate: f64,
    refund_success_rate: f64,
}

impl RandomOutcomes {
    pub fn new(authorize_success_rate: f64, refund_success_rate: f64) -> Self {
        Self {
            authorize_success_rate: authorize_success_rate.clamp(0.0, 1.0),
            refund_success_rate: refund_success_rate.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomOutcomes {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHORIZE_SUCCESS_RATE, DEFAULT_REFUND_SUCCESS_RATE)
    }
}

impl OutcomeSource for RandomOutcomes {
    fn next_outcome(&self, operation: GatewayOperation) -> Outcome {
        let rate = match operation {
            GatewayOperation::Authorize => self.authorize_success_rate,
            GatewayOperation::Refund => self.refund_success_rate,
        };
        if rand::thread_rng().gen_bool(rate) {
            Outcome::Approve
        } else {
            Outcome::Decline
        }
    }
}

/// Same outcome for every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub Outcome);

impl OutcomeSource for FixedOutcome {
    fn next_outcome(&self, _operation: GatewayOperation) -> Outcome {
        self.0
    }
}

/// Plays back queued outcomes per operation, then falls back to a default.
pub struct ScriptedOutcomes {
    authorize: Mutex<VecDeque<Outcome>>,
    refund: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
}

impl ScriptedOutcomes {
    pub fn new(fallback: Outcome) -> Self {
        Self {
            authorize: Mutex::new(VecDeque::new()),
            refund: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    pub fn with_authorize<I: IntoIterator<Item = Outcome>>(self, outcomes: I) -> Self {
        self.authorize
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outcomes);
        self
    }

    pub fn with_refund<I: IntoIterator<Item = Outcome>>(self, outcomes: I) -> Self {
        self.refund
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outcomes);
        self
    }
}

impl OutcomeSource for ScriptedOutcomes {
    fn next_outcome(&self, operation: GatewayOperation) -> Outcome {
        let queue = match operation {
            GatewayOperation::Authorize => &self.authorize,
            GatewayOperation::Refund => &self.refund,
        };
        queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

/// Gateway simulator with injectable outcomes and latencies.
///
/// Keeps per-operation call counters so callers can verify that nothing is
/// retried behind their back.
pub struct SimulatedGateway {
    outcomes: Arc<dyn OutcomeSource>,
    authorize_latency: Duration,
    refund_latency: Duration,
    authorize_calls: AtomicUsize,
    refund_calls: AtomicUsize,
}

impl SimulatedGateway {
    pub fn new(outcomes: Arc<dyn OutcomeSource>) -> Self {
        Self {
            outcomes,
            authorize_latency: DEFAULT_AUTHORIZE_LATENCY,
            refund_latency: DEFAULT_REFUND_LATENCY,
            authorize_calls: AtomicUsize::new(0),
            refund_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, authorize: Duration, refund: Duration) -> Self {
        self.authorize_latency = authorize;
        self.refund_latency = refund;
        self
    }

    /// No simulated latency; the usual choice in tests.
    pub fn instant(outcomes: Arc<dyn OutcomeSource>) -> Self {
        Self::new(outcomes).with_latency(Duration::ZERO, Duration::ZERO)
    }

    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn refund_calls(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, operation: GatewayOperation, latency: Duration) -> Outcome {
        let outcome = self.outcomes.next_outcome(operation);
        if outcome == Outcome::Hang {
            std::future::pending::<()>().await;
        }
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        outcome
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, request: &AuthorizationRequest) -> GatewayResult<String> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        info!(
            order_id = %request.order_id,
            payment_id = %request.payment_id,
            "Processing payment through payment gateway"
        );

        match self
            .respond(GatewayOperation::Authorize, self.authorize_latency)
            .await
        {
            Outcome::Approve => {
                let transaction_id = format!("PG-{}", Uuid::new_v4());
                info!(%transaction_id, "Payment processed successfully");
                Ok(transaction_id)
            }
            Outcome::Decline => {
                error!(order_id = %request.order_id, "Payment gateway declined the payment");
                Err(GatewayError::Declined(
                    "Payment declined by payment gateway".to_string(),
                ))
            }
            Outcome::Error | Outcome::Hang => {
                error!(order_id = %request.order_id, "Error occurred while processing payment");
                Err(GatewayError::Transient(
                    "Payment gateway error: processor unavailable".to_string(),
                ))
            }
        }
    }

    async fn refund(&self, transaction_id: &str) -> GatewayResult<String> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        info!(%transaction_id, "Processing refund through payment gateway");

        match self
            .respond(GatewayOperation::Refund, self.refund_latency)
            .await
        {
            Outcome::Approve => {
                let refund_id = format!("RF-{}", Uuid::new_v4());
                info!(%refund_id, "Refund processed successfully");
                Ok(refund_id)
            }
            Outcome::Decline => {
                error!(%transaction_id, "Payment gateway declined the refund");
                Err(GatewayError::Declined(
                    "Refund declined by payment gateway".to_string(),
                ))
            }
            Outcome::Error | Outcome::Hang => {
                error!(%transaction_id, "Error occurred while processing refund");
                Err(GatewayError::Transient(
                    "Payment gateway error during refund: processor unavailable".to_string(),
                ))
            }
        }
    }
}
