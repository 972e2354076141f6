//! Scripted in-memory event source.

use ordertrack_core::source::{
    AckHandle, AckMode, ConsumerEvent, ConsumerEvents, EventSource, InboundMessage, SessionEvent,
    SessionEvents, SourceError,
};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// An [`EventSource`] driven entirely by the test.
///
/// Connect and bind succeed unless a failure has been scripted with
/// [`fail_next_connect`](Self::fail_next_connect) /
/// [`fail_next_bind`](Self::fail_next_bind). Every attempt is timestamped so
/// tests under paused time can assert retry spacing. After a successful
/// connect or bind, the test pushes signals through
/// [`emit_session`](Self::emit_session), [`emit_consumer`](Self::emit_consumer)
/// and [`deliver`](Self::deliver).
#[derive(Default)]
pub struct ScriptedEventSource {
    connect_failures: Mutex<VecDeque<SourceError>>,
    bind_failures: Mutex<VecDeque<SourceError>>,
    connect_attempts: Mutex<Vec<Instant>>,
    bind_attempts: Mutex<Vec<Instant>>,
    session_tx: Mutex<Option<mpsc::Sender<SessionEvent>>>,
    consumer_tx: Mutex<Option<mpsc::Sender<ConsumerEvent>>>,
}

impl ScriptedEventSource {
    /// A source where every connect and bind succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next connect attempt to fail. Stackable.
    pub fn fail_next_connect(&self, error: SourceError) {
        self.connect_failures.lock().unwrap().push_back(error);
    }

    /// Script the next bind attempt to fail. Stackable.
    pub fn fail_next_bind(&self, error: SourceError) {
        self.bind_failures.lock().unwrap().push_back(error);
    }

    /// Timestamps of all connect attempts so far.
    #[must_use]
    pub fn connect_attempts(&self) -> Vec<Instant> {
        self.connect_attempts.lock().unwrap().clone()
    }

    /// Timestamps of all bind attempts so far.
    #[must_use]
    pub fn bind_attempts(&self) -> Vec<Instant> {
        self.bind_attempts.lock().unwrap().clone()
    }

    /// Whether a session channel is currently open.
    #[must_use]
    pub fn session_live(&self) -> bool {
        self.session_tx
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Whether a consumer channel is currently open.
    #[must_use]
    pub fn consumer_bound(&self) -> bool {
        self.consumer_tx
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Wait until a consumer is bound and listening.
    pub async fn wait_until_bound(&self) {
        while !self.consumer_bound() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Emit a session signal. Panics if no session is live.
    pub async fn emit_session(&self, event: SessionEvent) {
        let tx = self.session_tx.lock().unwrap().clone().unwrap();
        tx.send(event).await.unwrap();
    }

    /// Emit a consumer signal. Panics if no consumer is bound.
    pub async fn emit_consumer(&self, event: ConsumerEvent) {
        let tx = self.consumer_tx.lock().unwrap().clone().unwrap();
        tx.send(event).await.unwrap();
    }

    /// Deliver a message to the bound consumer.
    ///
    /// Returns the ack receiver; it fires once the pipeline acknowledged the
    /// message, which makes it the synchronization point for assertions.
    pub async fn deliver(&self, topic: &str, payload: &[u8]) -> oneshot::Receiver<()> {
        let (handle, acked) = AckHandle::tracked();
        let message = InboundMessage::new(topic.to_string(), payload.to_vec(), handle);
        self.emit_consumer(ConsumerEvent::Message(message)).await;
        acked
    }
}

impl EventSource for ScriptedEventSource {
    fn connect(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<SessionEvents, SourceError>> + Send + '_>> {
        Box::pin(async move {
            self.connect_attempts.lock().unwrap().push(Instant::now());

            if let Some(error) = self.connect_failures.lock().unwrap().pop_front() {
                return Err(error);
            }

            let (tx, rx) = mpsc::channel(16);
            *self.session_tx.lock().unwrap() = Some(tx);
            Ok(rx)
        })
    }

    fn bind_consumer(
        &self,
        _queue: &str,
        _mode: AckMode,
    ) -> Pin<Box<dyn Future<Output = Result<ConsumerEvents, SourceError>> + Send + '_>> {
        Box::pin(async move {
            self.bind_attempts.lock().unwrap().push(Instant::now());

            if let Some(error) = self.bind_failures.lock().unwrap().pop_front() {
                return Err(error);
            }

            let (tx, rx) = mpsc::channel(16);
            *self.consumer_tx.lock().unwrap() = Some(tx);
            Ok(rx)
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)] // Tests panic on unexpected signals

    use super::*;

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let source = ScriptedEventSource::new();
        source.fail_next_connect(SourceError::ConnectionFailed {
            reason: "scripted".to_string(),
        });

        assert!(source.connect().await.is_err());
        assert!(source.connect().await.is_ok());
        assert_eq!(source.connect_attempts().len(), 2);
    }

    #[tokio::test]
    async fn delivered_messages_reach_the_bound_consumer() {
        let source = ScriptedEventSource::new();
        let mut events = source
            .bind_consumer("all-order-updates", AckMode::Client)
            .await
            .unwrap();

        let acked = source.deliver("orders/x", br#"{"id":"1"}"#).await;

        let Some(ConsumerEvent::Message(message)) = events.recv().await else {
            panic!("expected a message");
        };
        assert_eq!(message.topic(), "orders/x");
        message.ack();
        acked.await.unwrap();
    }
}
