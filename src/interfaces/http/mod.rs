//! JSON-over-HTTP surface of the service.

pub mod dto;
pub mod error;
pub mod handlers;

use crate::application::engine::PaymentEngine;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PaymentEngine>,
}

impl AppState {
    pub fn new(engine: PaymentEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/payments", post(handlers::process_payment))
        .route(
            "/api/payments/:id",
            get(handlers::get_payment).delete(handlers::delete_payment),
        )
        .route(
            "/api/payments/order/:order_id",
            get(handlers::get_payments_by_order),
        )
        .route("/api/payments/:id/refund", post(handlers::refund_payment))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
