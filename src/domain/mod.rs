//! Domain layer: the payment aggregate, its lifecycle events, and the ports
//! the application layer talks to.

pub mod events;
pub mod payment;
pub mod ports;
