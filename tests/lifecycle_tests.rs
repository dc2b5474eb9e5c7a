mod common;

use chrono::Utc;
use common::{Harness, RecordingSink, card_payment};
use payment_orchestrator::domain::payment::{
    Amount, NewPayment, OrderId, PaymentId, PaymentMethod, PaymentStatus,
};
use payment_orchestrator::domain::ports::PaymentStore;
use payment_orchestrator::error::PaymentError;
use payment_orchestrator::infrastructure::gateway::{FixedOutcome, Outcome, ScriptedOutcomes};
use payment_orchestrator::infrastructure::in_memory::InMemoryPaymentStore;
use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn test_always_authorize_scenario() {
    let harness = Harness::new(FixedOutcome(Outcome::Approve));
    let engine = &harness.engine;

    let payment = engine.process(card_payment(1, "99.99")).await.unwrap();

    assert_eq!(payment.order_id(), OrderId::new(1));
    assert_eq!(payment.amount().value(), dec!(99.99));
    assert_eq!(payment.status(), PaymentStatus::Completed);
    let transaction_id = payment.transaction_id().unwrap_or_default();
    assert!(transaction_id.starts_with("PG-"));
    assert!(payment.updated_at() >= payment.created_at());

    let stored = engine.get_by_id(payment.id()).await.unwrap();
    assert_eq!(stored, payment);
    assert_eq!(harness.gateway.authorize_calls(), 1);

    let delivered = harness.delivered().await;
    assert_eq!(delivered, vec!["confirmed:1", "order-paid:1"]);
}

#[tokio::test]
async fn test_always_decline_scenario() {
    let harness = Harness::new(FixedOutcome(Outcome::Decline));

    let result = harness.engine.process(card_payment(1, "99.99")).await;
    assert!(matches!(
        result,
        Err(PaymentError::Processing { ref reason, .. })
            if reason == "Payment declined by payment gateway"
    ));

    let payments = harness.engine.get_by_order(OrderId::new(1)).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status(), PaymentStatus::Failed);
    assert_eq!(payments[0].transaction_id(), None);
    assert_eq!(harness.gateway.authorize_calls(), 1);

    assert_eq!(
        harness.delivered().await,
        vec!["failed:1:Payment declined by payment gateway"]
    );
}

#[tokio::test]
async fn test_gateway_error_fails_without_retry() {
    let outcomes = ScriptedOutcomes::new(Outcome::Approve)
        .with_authorize([Outcome::Error]);
    let harness = Harness::new(outcomes);

    let result = harness.engine.process(card_payment(5, "10.00")).await;
    assert!(matches!(
        result,
        Err(PaymentError::Processing { ref reason, .. })
            if reason.starts_with("Payment gateway error")
    ));
    assert_eq!(harness.gateway.authorize_calls(), 1);

    let payments = harness.engine.get_by_order(OrderId::new(5)).await.unwrap();
    assert_eq!(payments[0].status(), PaymentStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_timeout_cancels() {
    let harness = Harness::new(FixedOutcome(Outcome::Hang))
        .with_gateway_timeout(Duration::from_millis(250));

    let result = harness.engine.process(card_payment(2, "15.00")).await;
    assert!(matches!(
        result,
        Err(PaymentError::Processing { ref reason, .. }) if reason.contains("250ms")
    ));

    let payments = harness.engine.get_by_order(OrderId::new(2)).await.unwrap();
    assert_eq!(payments[0].status(), PaymentStatus::Cancelled);
    assert_eq!(payments[0].transaction_id(), None);

    let refund = harness.engine.refund(payments[0].id()).await;
    assert!(matches!(
        refund,
        Err(PaymentError::Precondition {
            status: PaymentStatus::Cancelled,
            ..
        })
    ));
}

#[tokio::test]
async fn test_refund_flow() {
    let harness = Harness::new(FixedOutcome(Outcome::Approve));
    let engine = &harness.engine;
    let payment = engine.process(card_payment(3, "42.00")).await.unwrap();

    let refunded = engine.refund(payment.id()).await.unwrap();
    assert_eq!(refunded.status(), PaymentStatus::Refunded);
    assert_eq!(refunded.transaction_id(), payment.transaction_id());
    assert!(refunded.updated_at() >= payment.updated_at());
    assert_eq!(harness.gateway.refund_calls(), 1);

    assert_eq!(
        harness.delivered().await,
        vec!["confirmed:3", "order-paid:3", "refunded:3", "order-refunded:3"]
    );
}

#[tokio::test]
async fn test_refund_decline_leaves_payment_untouched() {
    let outcomes = ScriptedOutcomes::new(Outcome::Approve)
        .with_refund([Outcome::Decline]);
    let harness = Harness::new(outcomes);
    let engine = &harness.engine;
    let payment = engine.process(card_payment(4, "8.50")).await.unwrap();

    let result = engine.refund(payment.id()).await;
    assert!(matches!(
        result,
        Err(PaymentError::Processing { ref reason, .. })
            if reason == "Failed to process refund: Refund declined by payment gateway"
    ));
    let stored = engine.get_by_id(payment.id()).await.unwrap();
    assert_eq!(stored, payment);

    // Confirmation only; no refund event.
    let delivered = harness.delivered().await;
    assert_eq!(delivered, vec!["confirmed:4", "order-paid:4"]);
}

#[tokio::test]
async fn test_refund_rejected_for_failed_payment() {
    let harness = Harness::new(FixedOutcome(Outcome::Decline));
    let engine = &harness.engine;
    let _ = engine.process(card_payment(6, "1.00")).await;
    let mut payments = engine.get_by_order(OrderId::new(6)).await.unwrap();
    let failed = payments.remove(0);

    let result = engine.refund(failed.id()).await;
    assert!(matches!(
        result,
        Err(PaymentError::Precondition {
            status: PaymentStatus::Failed,
            ..
        })
    ));
    assert_eq!(engine.get_by_id(failed.id()).await.unwrap(), failed);
    assert_eq!(harness.gateway.refund_calls(), 0);
}

#[tokio::test]
async fn test_refund_rejected_before_completion() {
    let store = InMemoryPaymentStore::new();
    let now = Utc::now();
    let draft = |order| {
        let amount = Amount::new(dec!(25.00)).unwrap();
        NewPayment::new(OrderId::new(order), amount, PaymentMethod::Paypal, now)
    };
    let pending = store.insert(draft(11)).await.unwrap();
    let processing = draft(12).begin_processing(now).unwrap();
    let processing = store.insert(processing).await.unwrap();
    assert_eq!(pending.status(), PaymentStatus::Pending);
    assert_eq!(processing.status(), PaymentStatus::Processing);

    let harness = Harness::with_store(FixedOutcome(Outcome::Approve), Box::new(store));
    let engine = &harness.engine;

    for seeded in [pending, processing] {
        let result = engine.refund(seeded.id()).await;
        assert!(matches!(
            result,
            Err(PaymentError::Precondition { id, status })
                if id == seeded.id() && status == seeded.status()
        ));
        assert_eq!(engine.get_by_id(seeded.id()).await.unwrap(), seeded);
    }
    assert_eq!(harness.gateway.refund_calls(), 0);
}

#[tokio::test]
async fn test_order_lookup_is_in_creation_order() {
    let outcomes = ScriptedOutcomes::new(Outcome::Approve)
        .with_authorize([Outcome::Decline, Outcome::Approve]);
    let harness = Harness::new(outcomes);
    let engine = &harness.engine;

    let _ = engine.process(card_payment(7, "5.00")).await;
    engine.process(card_payment(7, "5.00")).await.unwrap();
    engine.process(card_payment(8, "9.00")).await.unwrap();

    let payments = engine.get_by_order(OrderId::new(7)).await.unwrap();
    let statuses: Vec<_> = payments.iter().map(|p| p.status()).collect();
    assert_eq!(
        statuses,
        vec![PaymentStatus::Failed, PaymentStatus::Completed]
    );
    assert!(payments[0].id() < payments[1].id());

    let unknown = engine.get_by_order(OrderId::new(99)).await.unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn test_delete_then_lookup() {
    let harness = Harness::new(FixedOutcome(Outcome::Approve));
    let engine = &harness.engine;
    let payment = engine.process(card_payment(9, "12.00")).await.unwrap();

    engine.delete(payment.id()).await.unwrap();

    assert!(matches!(
        engine.get_by_id(payment.id()).await,
        Err(PaymentError::NotFound(_))
    ));
    assert!(matches!(
        engine.delete(payment.id()).await,
        Err(PaymentError::NotFound(_))
    ));
    assert!(matches!(
        engine.refund(payment.id()).await,
        Err(PaymentError::NotFound(_))
    ));
    let remaining = engine.get_by_order(OrderId::new(9)).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let harness = Harness::new(FixedOutcome(Outcome::Approve));
    let result = harness.engine.get_by_id(PaymentId::new(12345)).await;
    assert!(matches!(
        result,
        Err(PaymentError::NotFound(id)) if id == PaymentId::new(12345)
    ));
}

#[tokio::test]
async fn test_failing_sinks_do_not_affect_results() {
    let sink = RecordingSink::failing();
    let harness = Harness::with_sink(FixedOutcome(Outcome::Approve), sink);
    let engine = &harness.engine;

    let payment = engine.process(card_payment(10, "30.00")).await.unwrap();
    assert_eq!(payment.status(), PaymentStatus::Completed);
    let refunded = engine.refund(payment.id()).await.unwrap();
    assert_eq!(refunded.status(), PaymentStatus::Refunded);

    // Every delivery was attempted even though each one failed.
    assert_eq!(harness.delivered().await.len(), 4);
}
