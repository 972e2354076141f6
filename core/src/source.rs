//! Broker-agnostic event source abstraction.
//!
//! The supervisors are written against [`EventSource`] so that the broker
//! backend stays swappable and the retry logic can be exercised against
//! in-memory fakes. A source hands out two channels of lifecycle signals:
//!
//! - [`EventSource::connect`] establishes the session. A resolved `Ok` means
//!   the session reached `Up`; the returned receiver later delivers
//!   session-loss signals. A resolved `Err` is the `ConnectFailed` case.
//! - [`EventSource::bind_consumer`] binds a guaranteed-delivery consumer to a
//!   pre-existing queue. `Ok` yields the consumer's signal channel (`Up`,
//!   `Message`, `Down`); `Err` is the consumer-level `ConnectFailed`.
//!
//! Messages carry an [`AckHandle`]; the consumer pipeline acknowledges every
//! message after processing, and the backend removes it from the queue only
//! once acknowledged.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors from event source operations.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// The session could not reach the broker.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Why the connection attempt failed
        reason: String,
    },

    /// The queue does not exist and the source does not provision queues.
    #[error("queue '{queue}' does not exist")]
    QueueMissing {
        /// The missing queue
        queue: String,
    },

    /// The consumer could not bind to the queue.
    #[error("bind to queue '{queue}' failed: {reason}")]
    BindFailed {
        /// The queue that failed to bind
        queue: String,
        /// Why the bind failed
        reason: String,
    },

    /// Network or transport error after the session was up.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Session-level lifecycle signals delivered after a successful connect.
#[derive(Debug)]
pub enum SessionEvent {
    /// The session dropped with an error.
    Down(String),
    /// The session disconnected without an error report.
    Disconnected,
}

/// Consumer-level lifecycle signals delivered after a successful bind.
#[derive(Debug)]
pub enum ConsumerEvent {
    /// The broker confirmed the consumer bind.
    Up,
    /// A message was delivered from the queue.
    Message(InboundMessage),
    /// The consumer failed while (re)connecting its flow.
    ConnectFailed(String),
    /// The consumer dropped after being up.
    Down(String),
}

/// How message removal from the queue is controlled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AckMode {
    /// The consumer acknowledges each message explicitly.
    Client,
    /// The backend acknowledges on delivery.
    Auto,
}

/// An immutable message envelope delivered from the queue.
///
/// Consumed exactly once: decode it, then acknowledge it through the handle.
#[derive(Debug)]
pub struct InboundMessage {
    topic: String,
    payload: Vec<u8>,
    ack: AckHandle,
}

impl InboundMessage {
    /// Build an envelope for delivery.
    #[must_use]
    pub const fn new(topic: String, payload: Vec<u8>, ack: AckHandle) -> Self {
        Self {
            topic,
            payload,
            ack,
        }
    }

    /// The topic the message was published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the envelope and acknowledge it to the broker.
    pub fn ack(self) {
        self.ack.ack();
    }
}

/// Handle used to acknowledge one delivered message.
///
/// Dropping the handle without calling [`AckHandle::ack`] leaves the message
/// unacknowledged; a durable backend will redeliver it.
#[derive(Debug)]
pub struct AckHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl AckHandle {
    /// A handle whose acknowledgment can be observed by the backend.
    ///
    /// The backend (or a test) keeps the receiver and completes the ack —
    /// e.g. commits the offset — once it fires.
    #[must_use]
    pub fn tracked() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A handle whose acknowledgment is a no-op, for auto-ack backends.
    #[must_use]
    pub const fn untracked() -> Self {
        Self { tx: None }
    }

    /// Acknowledge the message.
    pub fn ack(mut self) {
        if let Some(tx) = self.tx.take() {
            // The backend dropping its receiver means it no longer cares.
            let _ = tx.send(());
        }
    }
}

/// Receiver of session lifecycle signals.
pub type SessionEvents = mpsc::Receiver<SessionEvent>;

/// Receiver of consumer lifecycle signals.
pub type ConsumerEvents = mpsc::Receiver<ConsumerEvent>;

/// A broker backend usable as an ordered, durable event source.
///
/// Implementations must be `Send + Sync`; the trait is dyn-compatible so the
/// supervisors can hold an `Arc<dyn EventSource>`.
pub trait EventSource: Send + Sync {
    /// Establish the broker session.
    ///
    /// Resolves `Ok` once the session is up, with a channel that later
    /// delivers session-loss signals. Resolves `Err` if the broker cannot be
    /// reached; the caller decides on retry.
    fn connect(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<SessionEvents, SourceError>> + Send + '_>>;

    /// Bind a consumer to the named queue on the current session.
    ///
    /// The queue must pre-exist ([`SourceError::QueueMissing`] otherwise).
    /// On success, the returned channel delivers [`ConsumerEvent::Up`]
    /// followed by messages and, eventually, a loss signal.
    fn bind_consumer(
        &self,
        queue: &str,
        mode: AckMode,
    ) -> Pin<Box<dyn Future<Output = Result<ConsumerEvents, SourceError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;

    #[test]
    fn tracked_ack_fires_the_receiver() {
        let (handle, mut rx) = AckHandle::tracked();
        handle.ack();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn dropped_handle_never_acks() {
        let (handle, mut rx) = AckHandle::tracked();
        drop(handle);
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn message_exposes_topic_and_payload() {
        let msg = InboundMessage::new(
            "orders/order.validated".to_string(),
            br#"{"id":"42"}"#.to_vec(),
            AckHandle::untracked(),
        );
        assert_eq!(msg.topic(), "orders/order.validated");
        assert_eq!(msg.payload(), br#"{"id":"42"}"#);
        msg.ack();
    }
}
