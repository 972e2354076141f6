//! The session supervisor.
//!
//! Owns the one logical broker session as an explicit state machine
//! ([`SessionPhase`]) driven by a single loop: connect, hand the consumer
//! supervisor its attach notification on `Up`, wait for a loss signal, tear
//! the consumer down, sleep the configured delay, reconnect. Connection
//! failure is never fatal to the process; the loop retries indefinitely with
//! exactly one connect attempt in flight at a time.

use crate::consumer::ConsumerSupervisor;
use crate::metrics::ReconnectMetrics;
use crate::retry::ReconnectPolicy;
use ordertrack_core::source::{EventSource, SessionEvent};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Lifecycle phase of the logical broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session; nothing in flight.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The session is established.
    Up,
    /// The last attempt or session ended in an error.
    Failed,
}

/// Supervises the broker session and drives the consumer supervisor.
pub struct ConnectionSupervisor {
    source: Arc<dyn EventSource>,
    consumers: ConsumerSupervisor,
    policy: ReconnectPolicy,
    phase: SessionPhase,
    shutdown: watch::Receiver<bool>,
}

impl ConnectionSupervisor {
    /// Create a supervisor over the given source.
    ///
    /// Returns the supervisor and a shutdown sender; send `true` to stop the
    /// loop gracefully.
    #[must_use]
    pub fn new(
        source: Arc<dyn EventSource>,
        consumers: ConsumerSupervisor,
        policy: ReconnectPolicy,
    ) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let supervisor = Self {
            source,
            consumers,
            policy,
            phase: SessionPhase::Disconnected,
            shutdown: shutdown_rx,
        };

        (supervisor, shutdown_tx)
    }

    /// Run the supervision loop until shutdown.
    ///
    /// The loop never returns on broker failure; only the shutdown signal
    /// (or the sender being dropped) ends it.
    pub async fn run(mut self) {
        info!(delay = ?self.policy.delay(), "Starting connection supervisor");
        let reconnects = ReconnectMetrics;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.set_phase(SessionPhase::Connecting);
            match self.source.connect().await {
                Ok(mut session_events) => {
                    self.set_phase(SessionPhase::Up);
                    // One notification per transition into Up; attach itself
                    // is idempotent so a live consumer is never double-bound.
                    self.consumers.attach(Arc::clone(&self.source));

                    let lost_phase = tokio::select! {
                        event = session_events.recv() => match event {
                            Some(SessionEvent::Down(reason)) => {
                                warn!(reason = %reason, "Session down, scheduling reconnect");
                                SessionPhase::Failed
                            }
                            Some(SessionEvent::Disconnected) | None => {
                                warn!("Session disconnected, scheduling reconnect");
                                SessionPhase::Disconnected
                            }
                        },
                        _ = self.shutdown.changed() => break,
                    };

                    // The consumer exists only while the session is up.
                    self.consumers.detach().await;
                    self.set_phase(lost_phase);
                }
                Err(e) => {
                    self.set_phase(SessionPhase::Failed);
                    warn!(error = %e, "Failed to connect to broker, scheduling reconnect");
                }
            }

            reconnects.record_session();
            tokio::select! {
                () = tokio::time::sleep(self.policy.delay()) => {}
                _ = self.shutdown.changed() => break,
            }
        }

        self.consumers.detach().await;
        self.set_phase(SessionPhase::Disconnected);
        info!("Connection supervisor stopped");
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "Session phase transition");
            self.phase = phase;
        }
    }
}
