//! Application layer containing the payment lifecycle orchestration.
//!
//! [`engine::PaymentEngine`] is the single entry point for every operation.
//! Transitions on one payment are serialized with [`locks::PaymentLocks`];
//! side effects leave through [`dispatcher::EventPublisher`] and are delivered
//! off the request path.

pub mod dispatcher;
pub mod engine;
pub mod locks;
