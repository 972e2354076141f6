//! Broker configuration.
//!
//! All connection settings are supplied by the application; the only default
//! baked into the service itself is the reconnect delay. [`BrokerConfig::default`]
//! exists for local development against a localhost broker.

use std::time::Duration;

/// Delay between reconnect attempts when the session or consumer goes down.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Name of the durable queue carrying order lifecycle updates.
pub const DEFAULT_QUEUE_NAME: &str = "all-order-updates";

/// Connection settings for the broker-backed event source.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Broker address (e.g. "localhost:9092").
    pub address: String,

    /// Logical namespace scoping this service on the broker.
    ///
    /// Generalizes the message-VPN of the original deployment; backends use it
    /// to derive client/group identifiers.
    pub namespace: String,

    /// Username for broker authentication. Empty disables authentication.
    pub username: String,

    /// Password for broker authentication.
    pub password: String,

    /// Name of the durable queue to consume from. The queue must pre-exist;
    /// the service never provisions it.
    pub queue_name: String,

    /// Delay between reconnect attempts.
    ///
    /// Default: 5000 ms
    pub reconnect_delay: Duration,
}

impl BrokerConfig {
    /// Create a configuration for the given broker address.
    #[must_use]
    pub fn new(address: String) -> Self {
        Self {
            address,
            namespace: "default".to_string(),
            username: String::new(),
            password: String::new(),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the broker credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the queue name.
    #[must_use]
    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }

    /// Set the reconnect delay.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new("localhost:9092".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_local_broker() {
        let config = BrokerConfig::default();
        assert_eq!(config.address, "localhost:9092");
        assert_eq!(config.queue_name, DEFAULT_QUEUE_NAME);
        assert_eq!(config.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        assert!(config.username.is_empty());
    }

    #[test]
    fn builders_override_defaults() {
        let config = BrokerConfig::new("broker.internal:9092".to_string())
            .with_namespace("retail")
            .with_credentials("orders", "secret")
            .with_queue_name("order-updates-staging")
            .with_reconnect_delay(Duration::from_secs(1));

        assert_eq!(config.namespace, "retail");
        assert_eq!(config.username, "orders");
        assert_eq!(config.password, "secret");
        assert_eq!(config.queue_name, "order-updates-staging");
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
    }
}
