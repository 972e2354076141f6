//! The consumer supervisor and its message pipeline.
//!
//! One logical consumer per process, bound to the fixed queue name. The
//! supervisor tears down and recreates the consumer on every loss signal,
//! sleeping the configured delay between attempts, and never gives up.
//!
//! Every delivered message runs through decode → apply → ack. The ack is
//! unconditional: decode failures and projection rejections are logged and
//! counted, but the message is still acknowledged so a poison message can
//! never stall the queue. The flip side is that such messages are permanently
//! lost rather than dead-lettered.

use crate::metrics::{PipelineMetrics, ReconnectMetrics};
use crate::retry::ReconnectPolicy;
use ordertrack_core::event::decode;
use ordertrack_core::projection::{ApplyOutcome, OrderProjection, RejectReason};
use ordertrack_core::source::{AckMode, ConsumerEvent, EventSource, InboundMessage};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Supervises the single guaranteed-delivery consumer.
///
/// `attach` is idempotent: while a consumer loop is running, further attach
/// calls are ignored, so the session supervisor can notify on every `Up`
/// transition without double-binding.
pub struct ConsumerSupervisor {
    queue: String,
    policy: ReconnectPolicy,
    projection: Arc<OrderProjection>,
    task: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl ConsumerSupervisor {
    /// Create a supervisor for the given queue.
    #[must_use]
    pub const fn new(
        queue: String,
        policy: ReconnectPolicy,
        projection: Arc<OrderProjection>,
    ) -> Self {
        Self {
            queue,
            policy,
            projection,
            task: None,
        }
    }

    /// Whether a consumer loop is currently running.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Start the consumer loop against the given source.
    ///
    /// No-op if a loop is already running.
    pub fn attach(&mut self, source: Arc<dyn EventSource>) {
        if self.is_attached() {
            debug!(queue = %self.queue, "Consumer already attached");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(consumer_loop(
            source,
            self.queue.clone(),
            self.policy,
            Arc::clone(&self.projection),
            shutdown_rx,
        ));
        self.task = Some((shutdown_tx, handle));
    }

    /// Tear down the running consumer, if any.
    ///
    /// Best-effort: teardown failures are logged, never propagated.
    pub async fn detach(&mut self) {
        if let Some((shutdown_tx, handle)) = self.task.take() {
            let _ = shutdown_tx.send(true);
            if let Err(e) = handle.await {
                warn!(queue = %self.queue, error = %e, "Consumer task ended abnormally during teardown");
            }
            info!(queue = %self.queue, "Consumer detached");
        }
    }
}

/// Bind, pump, rebind — forever, until shutdown.
async fn consumer_loop(
    source: Arc<dyn EventSource>,
    queue: String,
    policy: ReconnectPolicy,
    projection: Arc<OrderProjection>,
    mut shutdown: watch::Receiver<bool>,
) {
    let pipeline = PipelineMetrics;
    let reconnects = ReconnectMetrics;

    loop {
        if *shutdown.borrow() {
            break;
        }

        match source.bind_consumer(&queue, AckMode::Client).await {
            Ok(mut events) => {
                loop {
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                return;
                            }
                        }
                        event = events.recv() => match event {
                            Some(ConsumerEvent::Up) => {
                                info!(queue = %queue, "Connected to queue");
                            }
                            Some(ConsumerEvent::Message(message)) => {
                                handle_message(&projection, pipeline, message).await;
                            }
                            Some(ConsumerEvent::ConnectFailed(reason)) => {
                                warn!(queue = %queue, reason = %reason, "Consumer connect failed, scheduling rebind");
                                break;
                            }
                            Some(ConsumerEvent::Down(reason)) => {
                                warn!(queue = %queue, reason = %reason, "Consumer down, scheduling rebind");
                                break;
                            }
                            None => {
                                warn!(queue = %queue, "Consumer signal channel closed, scheduling rebind");
                                break;
                            }
                        }
                    }
                }
                // The old consumer is torn down (receiver dropped) before a
                // new one is bound on the next iteration.
            }
            Err(e) => {
                warn!(queue = %queue, error = %e, "Failed to bind consumer, scheduling rebind");
            }
        }

        reconnects.record_consumer();
        tokio::select! {
            () = tokio::time::sleep(policy.delay()) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

/// Decode, apply, acknowledge. The ack happens on every path.
async fn handle_message(
    projection: &OrderProjection,
    metrics: PipelineMetrics,
    message: InboundMessage,
) {
    metrics.record_consumed();

    match decode(message.topic(), message.payload()) {
        Ok(event) => match projection.apply(&event).await {
            ApplyOutcome::Changed(state) => {
                debug!(order_id = %event.order_id, state = %state, "Order state updated");
            }
            ApplyOutcome::Unchanged => {
                debug!(order_id = %event.order_id, "Duplicate event, state unchanged");
            }
            ApplyOutcome::Rejected(RejectReason::UnknownOrder) => {
                warn!(order_id = %event.order_id, topic = message.topic(), "Event for unknown order dropped");
                metrics.record_rejection();
            }
        },
        Err(e) => {
            warn!(topic = message.topic(), error = %e, "Failed to decode message");
            metrics.record_decode_failure(e.reason_label());
        }
    }

    // Never dead-letter: a failed message is acknowledged and lost.
    message.ack();
}
