//! Service counters.
//!
//! Uses the `metrics` facade; binaries decide on the exporter. Call
//! [`register_metrics`] once at startup so the counters carry descriptions,
//! then record through the small recorder structs to keep call sites terse.

use metrics::{counter, describe_counter};

/// Register descriptions for all ordertrack counters.
pub fn register_metrics() {
    describe_counter!(
        "ordertrack_messages_consumed_total",
        "Total messages delivered by the queue consumer"
    );
    describe_counter!(
        "ordertrack_decode_failures_total",
        "Messages that failed decoding, labelled by reason"
    );
    describe_counter!(
        "ordertrack_projection_rejections_total",
        "Lifecycle events rejected by the projection"
    );
    describe_counter!(
        "ordertrack_reconnect_attempts_total",
        "Reconnect attempts, labelled by scope (session or consumer)"
    );
    describe_counter!(
        "ordertrack_baskets_created_total",
        "Baskets created through the storefront client"
    );
}

/// Counters for the message pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineMetrics;

impl PipelineMetrics {
    /// A message arrived from the queue.
    pub fn record_consumed(self) {
        counter!("ordertrack_messages_consumed_total").increment(1);
    }

    /// A message failed decoding.
    pub fn record_decode_failure(self, reason: &'static str) {
        counter!("ordertrack_decode_failures_total", "reason" => reason).increment(1);
    }

    /// The projection rejected a decoded event.
    pub fn record_rejection(self) {
        counter!("ordertrack_projection_rejections_total").increment(1);
    }
}

/// Counters for reconnect attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectMetrics;

impl ReconnectMetrics {
    /// The session supervisor scheduled a reconnect.
    pub fn record_session(self) {
        counter!("ordertrack_reconnect_attempts_total", "scope" => "session").increment(1);
    }

    /// The consumer supervisor scheduled a rebind.
    pub fn record_consumer(self) {
        counter!("ordertrack_reconnect_attempts_total", "scope" => "consumer").increment(1);
    }
}
