//! End-to-end projection scenario harness.

use crate::sink::RecordingSink;
use ordertrack_core::event::{decode, DecodeError};
use ordertrack_core::order::{OrderId, OrderState};
use ordertrack_core::projection::{ApplyOutcome, OrderProjection};
use std::sync::Arc;

/// Runs the decode → apply pipeline directly against a fresh projection.
///
/// Useful for asserting end-to-end semantics without standing up the
/// supervision loops: create orders, deliver raw messages, assert states.
pub struct ProjectionScenario {
    projection: Arc<OrderProjection>,
    sink: Arc<RecordingSink>,
}

impl ProjectionScenario {
    /// A fresh projection wired to a recording sink.
    #[must_use]
    pub fn new() -> Self {
        let sink = Arc::new(RecordingSink::new());
        let sink_handle: Arc<dyn ordertrack_core::projection::ProjectionSink> = sink.clone();
        let projection = Arc::new(OrderProjection::new().with_sink(sink_handle));
        Self { projection, sink }
    }

    /// Handle to the projection, e.g. for wiring supervisors.
    #[must_use]
    pub fn projection(&self) -> Arc<OrderProjection> {
        Arc::clone(&self.projection)
    }

    /// The recording sink.
    #[must_use]
    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    /// Register an order as created.
    pub async fn create_order(&self, order_id: &str) {
        assert!(
            self.projection.register(OrderId::from(order_id)).await,
            "order {order_id} already exists"
        );
    }

    /// Decode a raw message and apply the result.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the message cannot be decoded; the
    /// projection is untouched in that case.
    pub async fn deliver(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<ApplyOutcome, DecodeError> {
        let event = decode(topic, payload)?;
        Ok(self.projection.apply(&event).await)
    }

    /// Assert the current state of one order.
    pub async fn assert_state(&self, order_id: &str, expected: OrderState) {
        let actual = self.projection.state_of(&OrderId::from(order_id)).await;
        assert_eq!(
            actual,
            Some(expected),
            "order {order_id} should be {expected}"
        );
    }
}

impl Default for ProjectionScenario {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_lifecycle_reaches_shipped() {
        let scenario = ProjectionScenario::new();
        scenario.create_order("42").await;

        scenario
            .deliver("orders/order.validated", br#"{"id":"42"}"#)
            .await
            .unwrap();
        scenario.assert_state("42", OrderState::Validated).await;

        scenario
            .deliver("payments/payment.processed", br#"{"orderId":"42"}"#)
            .await
            .unwrap();
        scenario.assert_state("42", OrderState::PaymentProcessed).await;

        scenario
            .deliver("shipments/shipment.shipped", br#"{"orderId":"42"}"#)
            .await
            .unwrap();
        scenario.assert_state("42", OrderState::Shipped).await;

        assert_eq!(scenario.sink().changes().len(), 3);
    }
}
