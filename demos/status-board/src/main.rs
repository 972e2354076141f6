//! Status Board - Runnable Demo
//!
//! The console counterpart of the original order-status table: consumes
//! lifecycle events from the broker and logs a line for every order state
//! change. Demonstrates the full wiring:
//!
//! 1. Configuration from environment variables
//! 2. The Kafka event source behind both supervisors
//! 3. The projection with a log-line sink
//! 4. Order entry via the storefront client (or a local demo basket)
//!
//! Environment:
//! - `ORDERTRACK_BROKER_ADDRESS` (default `localhost:9092`)
//! - `ORDERTRACK_NAMESPACE` (default `default`)
//! - `ORDERTRACK_USERNAME` / `ORDERTRACK_PASSWORD` (default unauthenticated)
//! - `ORDERTRACK_QUEUE` (default `all-order-updates`)
//! - `ORDERTRACK_RECONNECT_DELAY_MS` (default `5000`)
//! - `ORDERTRACK_STOREFRONT_URL` (optional; creates a real basket when set)
//! - `ORDERTRACK_METRICS_ADDR` (optional; serves Prometheus metrics when set)

use anyhow::{Context, Result};
use ordertrack_core::config::BrokerConfig;
use ordertrack_core::order::{OrderId, OrderState};
use ordertrack_core::projection::{OrderProjection, ProjectionSink};
use ordertrack_kafka::KafkaEventSource;
use ordertrack_storefront::{demo_basket, StorefrontClient};
use ordertrack_supervisor::metrics::register_metrics;
use ordertrack_supervisor::{ConnectionSupervisor, ConsumerSupervisor, ReconnectPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Plays the role of the original status table: one log line per change.
struct StatusBoardSink;

impl ProjectionSink for StatusBoardSink {
    fn order_changed(&self, order_id: &OrderId, new_state: OrderState) {
        info!(order_id = %order_id, state = %new_state, "Order status changed");
    }
}

fn config_from_env() -> Result<BrokerConfig> {
    let mut config = BrokerConfig::new(
        std::env::var("ORDERTRACK_BROKER_ADDRESS")
            .unwrap_or_else(|_| "localhost:9092".to_string()),
    );

    if let Ok(namespace) = std::env::var("ORDERTRACK_NAMESPACE") {
        config = config.with_namespace(namespace);
    }
    if let Ok(username) = std::env::var("ORDERTRACK_USERNAME") {
        let password = std::env::var("ORDERTRACK_PASSWORD").unwrap_or_default();
        config = config.with_credentials(username, password);
    }
    if let Ok(queue) = std::env::var("ORDERTRACK_QUEUE") {
        config = config.with_queue_name(queue);
    }
    if let Ok(delay_ms) = std::env::var("ORDERTRACK_RECONNECT_DELAY_MS") {
        let delay_ms: u64 = delay_ms
            .parse()
            .context("ORDERTRACK_RECONNECT_DELAY_MS must be an integer")?;
        config = config.with_reconnect_delay(Duration::from_millis(delay_ms));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    register_metrics();
    if let Ok(addr) = std::env::var("ORDERTRACK_METRICS_ADDR") {
        let addr: std::net::SocketAddr = addr
            .parse()
            .context("ORDERTRACK_METRICS_ADDR must be a socket address")?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(addr = %addr, "Metrics available at http://{addr}/metrics");
    }

    let config = config_from_env()?;
    info!(
        address = %config.address,
        queue = %config.queue_name,
        "Starting status board"
    );

    let projection = Arc::new(OrderProjection::new().with_sink(Arc::new(StatusBoardSink)));

    // Orders enter the projection at CREATED, either through the storefront
    // or as a locally generated demo basket.
    if let Ok(base_url) = std::env::var("ORDERTRACK_STOREFRONT_URL") {
        let client = StorefrontClient::new(base_url);
        let basket = client.create_and_register(&projection).await?;
        info!(order_id = %basket.id, product = %basket.product, "Tracking storefront basket");
    } else {
        let basket = demo_basket();
        projection.register(OrderId::new(basket.id.clone())).await;
        info!(order_id = %basket.id, product = %basket.product, "Tracking demo basket");
    }

    let policy = ReconnectPolicy::from_config(&config);
    let queue = config.queue_name.clone();
    let source = Arc::new(KafkaEventSource::new(config));

    let consumers = ConsumerSupervisor::new(queue, policy, Arc::clone(&projection));
    let (supervisor, shutdown) = ConnectionSupervisor::new(source, consumers, policy);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            let _ = shutdown.send(true);
        }
    });

    supervisor.run().await;

    info!(orders = projection.len().await, "Status board stopped");
    Ok(())
}
