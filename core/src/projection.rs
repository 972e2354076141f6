//! The in-memory order projection and its notification contract.
//!
//! The projection maps order identifiers to their current lifecycle state.
//! Records enter the projection through [`OrderProjection::register`] when a
//! basket is created; lifecycle events only ever update existing records.
//! An event for an unknown order is rejected, not buffered — there is no
//! deferred re-application when the order later appears.
//!
//! Applying an event unconditionally overwrites the current state with the
//! event's target state. There is no monotonic ordering guard: a duplicate
//! event is reported as [`ApplyOutcome::Unchanged`], and an out-of-order event
//! regresses the state. This mirrors the upstream behavior and is covered by
//! tests as documentation.

use crate::event::LifecycleEvent;
use crate::order::{OrderId, OrderRecord, OrderState};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of applying a lifecycle event to the projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The order moved to a new state.
    Changed(OrderState),
    /// The order was already in the event's target state.
    Unchanged,
    /// The event could not be applied.
    Rejected(RejectReason),
}

/// Why an event was rejected by the projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// No record exists for the event's order id.
    UnknownOrder,
}

/// Observer notified whenever an order's state changes.
///
/// In the reference deployment this updates a status table row; only the
/// notification contract is defined here.
pub trait ProjectionSink: Send + Sync {
    /// Called after an order's state changed, with the new state.
    fn order_changed(&self, order_id: &OrderId, new_state: OrderState);
}

/// In-memory mapping from order id to current lifecycle state.
///
/// Created once at startup and shared by handle. Records are never deleted
/// during the process lifetime.
pub struct OrderProjection {
    orders: RwLock<HashMap<OrderId, OrderRecord>>,
    sinks: Vec<Arc<dyn ProjectionSink>>,
}

impl OrderProjection {
    /// Create an empty projection with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            sinks: Vec::new(),
        }
    }

    /// Add a sink to notify on state changes.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ProjectionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Register a newly created order at [`OrderState::Created`].
    ///
    /// Order ids are unique: registering an id that already exists leaves the
    /// existing record untouched and returns `false`.
    pub async fn register(&self, order_id: OrderId) -> bool {
        self.seed(OrderRecord::new(order_id, OrderState::Created))
            .await
    }

    /// Insert a pre-built record, e.g. one seeded from an upstream snapshot.
    ///
    /// Returns `false` without modifying anything if the id already exists.
    pub async fn seed(&self, record: OrderRecord) -> bool {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&record.order_id) {
            return false;
        }
        orders.insert(record.order_id.clone(), record);
        true
    }

    /// Apply a decoded lifecycle event.
    ///
    /// Looks up the record by order id, overwrites its state with the event's
    /// target state, and notifies all sinks on change. Events for unknown
    /// orders are rejected and leave the projection untouched.
    pub async fn apply(&self, event: &LifecycleEvent) -> ApplyOutcome {
        let target = event.kind.target_state();

        let outcome = {
            let mut orders = self.orders.write().await;
            match orders.get_mut(&event.order_id) {
                None => return ApplyOutcome::Rejected(RejectReason::UnknownOrder),
                Some(record) if record.state == target => return ApplyOutcome::Unchanged,
                Some(record) => {
                    record.state = target;
                    record.last_updated = Utc::now();
                    ApplyOutcome::Changed(target)
                }
            }
        };

        // Sinks run outside the write lock.
        for sink in &self.sinks {
            sink.order_changed(&event.order_id, target);
        }

        outcome
    }

    /// Current state of one order, if known.
    pub async fn state_of(&self, order_id: &OrderId) -> Option<OrderState> {
        self.orders.read().await.get(order_id).map(|r| r.state)
    }

    /// Snapshot of all records, in no particular order.
    pub async fn snapshot(&self) -> Vec<OrderRecord> {
        self.orders.read().await.values().cloned().collect()
    }

    /// Number of known orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the projection holds no orders.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

impl Default for OrderProjection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;
    use crate::event::{EventKind, LifecycleEvent};
    use std::sync::Mutex;

    fn event(order_id: &str, kind: EventKind) -> LifecycleEvent {
        LifecycleEvent {
            order_id: OrderId::from(order_id),
            kind,
            payload: serde_json::Map::new(),
        }
    }

    struct Recording(Mutex<Vec<(OrderId, OrderState)>>);

    impl ProjectionSink for Recording {
        fn order_changed(&self, order_id: &OrderId, new_state: OrderState) {
            self.0.lock().unwrap().push((order_id.clone(), new_state));
        }
    }

    #[tokio::test]
    async fn unknown_order_is_rejected_and_projection_unchanged() {
        let projection = OrderProjection::new();

        let outcome = projection.apply(&event("99", EventKind::Shipped)).await;

        assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::UnknownOrder));
        assert!(projection.is_empty().await);
        assert_eq!(projection.state_of(&OrderId::from("99")).await, None);
    }

    #[tokio::test]
    async fn registered_order_starts_created() {
        let projection = OrderProjection::new();
        assert!(projection.register(OrderId::from("42")).await);
        assert_eq!(
            projection.state_of(&OrderId::from("42")).await,
            Some(OrderState::Created)
        );
    }

    #[tokio::test]
    async fn registering_twice_keeps_the_existing_record() {
        let projection = OrderProjection::new();
        projection.register(OrderId::from("42")).await;
        projection.apply(&event("42", EventKind::OrderValidated)).await;

        assert!(!projection.register(OrderId::from("42")).await);
        assert_eq!(
            projection.state_of(&OrderId::from("42")).await,
            Some(OrderState::Validated)
        );
        assert_eq!(projection.len().await, 1);
    }

    #[tokio::test]
    async fn apply_overwrites_state_for_known_order() {
        let projection = OrderProjection::new();
        projection.register(OrderId::from("42")).await;

        let outcome = projection.apply(&event("42", EventKind::PaymentProcessed)).await;

        assert_eq!(outcome, ApplyOutcome::Changed(OrderState::PaymentProcessed));
        assert_eq!(
            projection.state_of(&OrderId::from("42")).await,
            Some(OrderState::PaymentProcessed)
        );
    }

    #[tokio::test]
    async fn duplicate_event_is_unchanged() {
        let projection = OrderProjection::new();
        projection.register(OrderId::from("42")).await;

        projection.apply(&event("42", EventKind::Shipped)).await;
        let outcome = projection.apply(&event("42", EventKind::Shipped)).await;

        assert_eq!(outcome, ApplyOutcome::Unchanged);
        assert_eq!(
            projection.state_of(&OrderId::from("42")).await,
            Some(OrderState::Shipped)
        );
    }

    #[tokio::test]
    async fn out_of_order_event_regresses_state() {
        // Documents the absence of a monotonic ordering guard: a late
        // validation event wins over an earlier shipment.
        let projection = OrderProjection::new();
        projection.register(OrderId::from("42")).await;

        projection.apply(&event("42", EventKind::Shipped)).await;
        let outcome = projection.apply(&event("42", EventKind::OrderValidated)).await;

        assert_eq!(outcome, ApplyOutcome::Changed(OrderState::Validated));
        assert_eq!(
            projection.state_of(&OrderId::from("42")).await,
            Some(OrderState::Validated)
        );
    }

    #[tokio::test]
    async fn sinks_are_notified_on_change_only() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let projection = OrderProjection::new().with_sink(recording.clone());
        projection.register(OrderId::from("42")).await;

        projection.apply(&event("42", EventKind::OrderValidated)).await;
        projection.apply(&event("42", EventKind::OrderValidated)).await; // duplicate
        projection.apply(&event("99", EventKind::Shipped)).await; // unknown

        let seen = recording.0.lock().unwrap().clone();
        assert_eq!(seen, vec![(OrderId::from("42"), OrderState::Validated)]);
    }

    #[tokio::test]
    async fn snapshot_lists_all_records() {
        let projection = OrderProjection::new();
        projection.register(OrderId::from("1")).await;
        projection.register(OrderId::from("2")).await;

        let snapshot = projection.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|r| r.state == OrderState::Created));
    }
}
