//! Reconnect policy shared by the session and consumer loops.

use ordertrack_core::config::{BrokerConfig, DEFAULT_RECONNECT_DELAY};
use std::time::Duration;

/// Fixed-delay, unbounded reconnect policy.
///
/// The upstream behavior is deliberate: there is no maximum retry count and
/// no growing backoff, just the same delay between every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    /// A policy retrying every `delay`.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// The policy configured on a [`BrokerConfig`].
    #[must_use]
    pub const fn from_config(config: &BrokerConfig) -> Self {
        Self::fixed(config.reconnect_delay)
    }

    /// Delay before the next attempt.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}
