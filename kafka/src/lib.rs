//! Kafka-backed event source for ordertrack.
//!
//! Implements [`EventSource`] on top of rdkafka, mapping the abstract session
//! and consumer lifecycle onto Kafka primitives:
//!
//! - **Connect** creates a probe client and fetches cluster metadata; success
//!   means the session is up. A background probe repeats the metadata fetch
//!   and synthesizes a [`SessionEvent::Down`] when the cluster becomes
//!   unreachable, since the Kafka client has no session-level signal of its
//!   own.
//! - **Bind** creates a `StreamConsumer` against the queue topic. The queue
//!   must pre-exist: a metadata probe rejects missing topics with
//!   [`SourceError::QueueMissing`] instead of letting broker-side
//!   auto-creation provision one.
//! - **Client ack** is a manual offset commit, performed only after the
//!   delivered message's [`AckHandle`] fires. If the process dies before the
//!   ack, the uncommitted message is redelivered (at-least-once).
//!
//! The consumer group and client id are scoped by the configured namespace so
//! several deployments can share a cluster.

use futures::StreamExt;
use ordertrack_core::config::BrokerConfig;
use ordertrack_core::source::{
    AckHandle, AckMode, ConsumerEvent, ConsumerEvents, EventSource, InboundMessage, SessionEvent,
    SessionEvents, SourceError,
};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single metadata probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Buffer between the Kafka consumer task and the supervisor.
const CONSUMER_BUFFER: usize = 64;

/// Kafka implementation of [`EventSource`].
///
/// # Example
///
/// ```no_run
/// use ordertrack_core::config::BrokerConfig;
/// use ordertrack_core::source::{AckMode, EventSource};
/// use ordertrack_kafka::KafkaEventSource;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = KafkaEventSource::new(BrokerConfig::default());
/// let _session = source.connect().await?;
/// let _consumer = source.bind_consumer("all-order-updates", AckMode::Client).await?;
/// # Ok(())
/// # }
/// ```
pub struct KafkaEventSource {
    config: BrokerConfig,
}

impl KafkaEventSource {
    /// Create a source for the given broker configuration.
    #[must_use]
    pub const fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    /// Consumer group id derived from the namespace and queue name.
    #[must_use]
    pub fn consumer_group(&self) -> String {
        format!("{}.{}", self.config.namespace, self.config.queue_name)
    }

    /// Client id derived from the namespace.
    #[must_use]
    pub fn client_id(&self) -> String {
        format!("{}.ordertrack", self.config.namespace)
    }

    /// Base client configuration shared by probe and consumer clients.
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.config.address)
            .set("client.id", self.client_id())
            .set("group.id", self.consumer_group());

        if !self.config.username.is_empty() {
            config
                .set("security.protocol", "sasl_plaintext")
                .set("sasl.mechanisms", "PLAIN")
                .set("sasl.username", &self.config.username)
                .set("sasl.password", &self.config.password);
        }

        config
    }
}

impl EventSource for KafkaEventSource {
    fn connect(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<SessionEvents, SourceError>> + Send + '_>> {
        let client_config = self.client_config();
        let address = self.config.address.clone();
        let probe_interval = self.config.reconnect_delay;

        Box::pin(async move {
            let client: BaseConsumer =
                client_config
                    .create()
                    .map_err(|e| SourceError::ConnectionFailed {
                        reason: format!("failed to create client: {e}"),
                    })?;

            // Client creation is lazy; the metadata fetch is the actual
            // reachability check.
            let client = tokio::task::spawn_blocking(move || {
                let result = client.fetch_metadata(None, PROBE_TIMEOUT);
                (client, result)
            })
            .await
            .map_err(|e| SourceError::ConnectionFailed {
                reason: format!("probe task failed: {e}"),
            })
            .and_then(|(client, result)| match result {
                Ok(_) => Ok(client),
                Err(e) => Err(SourceError::ConnectionFailed {
                    reason: e.to_string(),
                }),
            })?;

            tracing::info!(address = %address, "Broker session up");

            let (tx, rx) = mpsc::channel(8);

            // Liveness probe: Kafka surfaces no session events, so poll
            // metadata and synthesize Down on failure.
            tokio::spawn(async move {
                let mut probe = Some(client);
                loop {
                    tokio::select! {
                        () = tx.closed() => break,
                        () = tokio::time::sleep(probe_interval) => {
                            let Some(client) = probe.take() else { break };
                            let outcome = tokio::task::spawn_blocking(move || {
                                let result = client.fetch_metadata(None, PROBE_TIMEOUT);
                                (client, result)
                            })
                            .await;

                            match outcome {
                                Ok((client, Ok(_))) => probe = Some(client),
                                Ok((_, Err(e))) => {
                                    tracing::warn!(error = %e, "Broker probe failed, session down");
                                    let _ = tx.send(SessionEvent::Down(e.to_string())).await;
                                    break;
                                }
                                Err(e) => {
                                    let _ = tx
                                        .send(SessionEvent::Down(format!("probe task failed: {e}")))
                                        .await;
                                    break;
                                }
                            }
                        }
                    }
                }
                tracing::debug!("Session probe task exiting");
            });

            Ok(rx)
        })
    }

    fn bind_consumer(
        &self,
        queue: &str,
        mode: AckMode,
    ) -> Pin<Box<dyn Future<Output = Result<ConsumerEvents, SourceError>> + Send + '_>> {
        let queue = queue.to_string();
        let mut client_config = self.client_config();
        client_config.set(
            "enable.auto.commit",
            if mode == AckMode::Client { "false" } else { "true" },
        );
        client_config.set("auto.offset.reset", "latest");
        // Missing topics must surface as a bind failure, not be provisioned.
        client_config.set("allow.auto.create.topics", "false");

        Box::pin(async move {
            let consumer: StreamConsumer =
                client_config
                    .create()
                    .map_err(|e| SourceError::BindFailed {
                        queue: queue.clone(),
                        reason: format!("failed to create consumer: {e}"),
                    })?;

            // createIfMissing = false: probe for the topic before binding.
            let probe_queue = queue.clone();
            let (consumer, metadata) = tokio::task::spawn_blocking(move || {
                let result = consumer.fetch_metadata(Some(&probe_queue), PROBE_TIMEOUT);
                (consumer, result)
            })
            .await
            .map_err(|e| SourceError::BindFailed {
                queue: queue.clone(),
                reason: format!("probe task failed: {e}"),
            })?;

            let metadata = metadata.map_err(|e| SourceError::BindFailed {
                queue: queue.clone(),
                reason: e.to_string(),
            })?;

            let exists = metadata
                .topics()
                .iter()
                .any(|t| t.name() == queue && t.error().is_none() && !t.partitions().is_empty());
            if !exists {
                return Err(SourceError::QueueMissing { queue });
            }

            consumer
                .subscribe(&[queue.as_str()])
                .map_err(|e| SourceError::BindFailed {
                    queue: queue.clone(),
                    reason: e.to_string(),
                })?;

            tracing::info!(queue = %queue, manual_commit = (mode == AckMode::Client), "Consumer bound");

            let (tx, rx) = mpsc::channel(CONSUMER_BUFFER);

            tokio::spawn(async move {
                if tx.send(ConsumerEvent::Up).await.is_err() {
                    return;
                }

                let mut stream = consumer.stream();

                loop {
                    tokio::select! {
                        () = tx.closed() => break,
                        next = stream.next() => match next {
                            Some(Ok(message)) => {
                                let payload =
                                    message.payload().map(<[u8]>::to_vec).unwrap_or_default();
                                let topic = message.topic().to_string();

                                let (handle, acked) = match mode {
                                    AckMode::Client => {
                                        let (handle, acked) = AckHandle::tracked();
                                        (handle, Some(acked))
                                    }
                                    AckMode::Auto => (AckHandle::untracked(), None),
                                };

                                let inbound = InboundMessage::new(topic, payload, handle);
                                if tx.send(ConsumerEvent::Message(inbound)).await.is_err() {
                                    break;
                                }

                                // Commit only after the client acknowledged;
                                // an unacked message must stay redeliverable.
                                if let Some(acked) = acked {
                                    if acked.await.is_err() {
                                        tracing::debug!(
                                            "Ack handle dropped without ack, leaving offset uncommitted"
                                        );
                                        break;
                                    }
                                    if let Err(e) =
                                        consumer.commit_message(&message, CommitMode::Async)
                                    {
                                        tracing::warn!(
                                            topic = message.topic(),
                                            partition = message.partition(),
                                            offset = message.offset(),
                                            error = %e,
                                            "Failed to commit offset (message may be redelivered)"
                                        );
                                    }
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "Consumer stream error");
                                let _ = tx.send(ConsumerEvent::Down(e.to_string())).await;
                                break;
                            }
                            None => {
                                let _ = tx
                                    .send(ConsumerEvent::Down("consumer stream ended".to_string()))
                                    .await;
                                break;
                            }
                        }
                    }
                }

                tracing::debug!("Consumer task exiting");
            });

            Ok(rx)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kafka_event_source_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<KafkaEventSource>();
        assert_sync::<KafkaEventSource>();
    }

    #[test]
    fn group_and_client_ids_are_namespace_scoped() {
        let source = KafkaEventSource::new(
            BrokerConfig::default()
                .with_namespace("retail")
                .with_queue_name("all-order-updates"),
        );

        assert_eq!(source.consumer_group(), "retail.all-order-updates");
        assert_eq!(source.client_id(), "retail.ordertrack");
    }
}
