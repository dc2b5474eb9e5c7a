#![allow(dead_code)]

use async_trait::async_trait;
use payment_orchestrator::application::dispatcher::EventDispatcher;
use payment_orchestrator::application::engine::{PaymentEngine, ProcessPayment};
use payment_orchestrator::domain::payment::{Amount, OrderId, Payment, PaymentId, PaymentMethod};
use payment_orchestrator::domain::ports::{
    NotificationSink, OrderSync, PaymentStoreBox, SinkError,
};
use payment_orchestrator::infrastructure::gateway::{OutcomeSource, SimulatedGateway};
use payment_orchestrator::infrastructure::in_memory::InMemoryPaymentStore;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Records every side effect it is asked to perform, optionally failing each one.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            Err(SinkError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn payment_confirmed(&self, payment: &Payment) -> Result<(), SinkError> {
        self.record(format!("confirmed:{}", payment.order_id()))
    }

    async fn payment_failed(&self, order_id: OrderId, reason: &str) -> Result<(), SinkError> {
        self.record(format!("failed:{order_id}:{reason}"))
    }

    async fn refund_confirmed(&self, payment: &Payment) -> Result<(), SinkError> {
        self.record(format!("refunded:{}", payment.order_id()))
    }
}

#[async_trait]
impl OrderSync for RecordingSink {
    async fn order_paid(
        &self,
        order_id: OrderId,
        _payment_id: PaymentId,
    ) -> Result<(), SinkError> {
        self.record(format!("order-paid:{order_id}"))
    }

    async fn order_refunded(
        &self,
        order_id: OrderId,
        _payment_id: PaymentId,
    ) -> Result<(), SinkError> {
        self.record(format!("order-refunded:{order_id}"))
    }
}

/// An engine over an instant simulated gateway, by default backed by the
/// in-memory store.
pub struct Harness {
    pub engine: PaymentEngine,
    pub gateway: Arc<SimulatedGateway>,
    pub sink: Arc<RecordingSink>,
    dispatcher: EventDispatcher,
}

impl Harness {
    pub fn new(outcomes: impl OutcomeSource + 'static) -> Self {
        Self::with_sink(outcomes, RecordingSink::default())
    }

    pub fn with_sink(outcomes: impl OutcomeSource + 'static, sink: RecordingSink) -> Self {
        let store = Box::new(InMemoryPaymentStore::new());
        Self::build(outcomes, sink, store)
    }

    /// Runs the engine over a store the test has already seeded or wrapped.
    pub fn with_store(outcomes: impl OutcomeSource + 'static, store: PaymentStoreBox) -> Self {
        Self::build(outcomes, RecordingSink::default(), store)
    }

    fn build(
        outcomes: impl OutcomeSource + 'static,
        sink: RecordingSink,
        store: PaymentStoreBox,
    ) -> Self {
        let gateway = Arc::new(SimulatedGateway::instant(Arc::new(outcomes)));
        let sink = Arc::new(sink);
        let (events, dispatcher) = EventDispatcher::spawn(sink.clone(), sink.clone(), 64);
        let engine = PaymentEngine::new(store, gateway.clone(), events);
        Self {
            engine,
            gateway,
            sink,
            dispatcher,
        }
    }

    pub fn with_gateway_timeout(self, timeout: std::time::Duration) -> Self {
        Self {
            engine: self.engine.with_gateway_timeout(timeout),
            ..self
        }
    }

    /// Stops the engine and returns every side effect delivered so far.
    pub async fn delivered(self) -> Vec<String> {
        drop(self.engine);
        self.dispatcher.shutdown().await;
        self.sink.calls()
    }
}

pub fn card_payment(order_id: u64, amount: &str) -> ProcessPayment {
    ProcessPayment {
        order_id: OrderId::new(order_id),
        amount: Amount::new(Decimal::from_str(amount).unwrap()).unwrap(),
        method: PaymentMethod::CreditCard,
        card_number: Some("4111111111111111".to_string()),
        idempotency_key: None,
    }
}
