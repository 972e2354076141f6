//! # Ordertrack Core
//!
//! Core types and traits for the ordertrack order-status service.
//!
//! Ordertrack consumes order-lifecycle events from a durable broker queue and
//! folds them into an in-memory projection of current order state. This crate
//! defines the pieces everything else is built from:
//!
//! - **Domain model** ([`order`]): order identifiers, lifecycle states, the
//!   projection record, and the basket record returned by the storefront.
//! - **Event decoding** ([`event`]): the pure function that turns a raw
//!   `(topic, payload)` pair into a typed [`event::LifecycleEvent`] or a
//!   [`event::DecodeError`].
//! - **Projection** ([`projection`]): the order-id to state mapping, the
//!   apply policy, and the [`projection::ProjectionSink`] notification
//!   contract.
//! - **Event source abstraction** ([`source`]): broker-agnostic traits for
//!   sessions and guaranteed-delivery consumers, plus the lifecycle signals
//!   the supervisors react to.
//! - **Configuration** ([`config`]): the externally supplied broker settings.
//!
//! ## Design Principles
//!
//! - Decoding is pure: no I/O, no side effects, same output for same input
//! - The projection never invents records: lifecycle events only update
//!   orders that were registered through basket creation
//! - Broker specifics stay behind [`source`] traits so the supervisors can be
//!   exercised against in-memory fakes
//!
//! ## Example
//!
//! ```
//! use ordertrack_core::event::{decode, DecodeError, EventKind};
//!
//! # fn main() -> Result<(), DecodeError> {
//! let event = decode("orders/order.validated", br#"{"id":"42"}"#)?;
//! assert_eq!(event.kind, EventKind::OrderValidated);
//! assert_eq!(event.order_id.as_str(), "42");
//! # Ok(())
//! # }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod config;
pub mod event;
pub mod order;
pub mod projection;
pub mod source;
