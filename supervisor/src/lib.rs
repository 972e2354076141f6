//! # Ordertrack Supervisor
//!
//! The supervision loops that keep the order projection fed:
//!
//! - [`ConnectionSupervisor`](connection::ConnectionSupervisor) owns the
//!   broker session lifecycle: connect, detect loss, reconnect forever with a
//!   fixed delay.
//! - [`ConsumerSupervisor`](consumer::ConsumerSupervisor) owns the single
//!   guaranteed-delivery consumer: bind, pump messages through the decode →
//!   apply → ack pipeline, rebind on loss.
//!
//! Failure is never fatal here. Both loops log, count a reconnect attempt,
//! sleep the configured delay, and try again — indefinitely. The only way out
//! is the shutdown signal.

pub mod connection;
pub mod consumer;
pub mod metrics;
pub mod retry;

pub use connection::{ConnectionSupervisor, SessionPhase};
pub use consumer::ConsumerSupervisor;
pub use retry::ReconnectPolicy;
