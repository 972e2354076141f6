//! Recording projection sink.

use ordertrack_core::order::{OrderId, OrderState};
use ordertrack_core::projection::ProjectionSink;
use std::sync::Mutex;

/// A [`ProjectionSink`] that records every change notification.
#[derive(Debug, Default)]
pub struct RecordingSink {
    changes: Mutex<Vec<(OrderId, OrderState)>>,
}

impl RecordingSink {
    /// An empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far, in order.
    #[must_use]
    pub fn changes(&self) -> Vec<(OrderId, OrderState)> {
        self.changes.lock().unwrap().clone()
    }

    /// The most recently notified state for one order.
    #[must_use]
    pub fn last_state_of(&self, order_id: &OrderId) -> Option<OrderState> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| id == order_id)
            .map(|(_, state)| *state)
    }
}

impl ProjectionSink for RecordingSink {
    fn order_changed(&self, order_id: &OrderId, new_state: OrderState) {
        self.changes
            .lock()
            .unwrap()
            .push((order_id.clone(), new_state));
    }
}
