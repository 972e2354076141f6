//! Order domain types.
//!
//! Orders progress through a fixed lifecycle: Created → Validated →
//! `PaymentProcessed` → Shipped. `Initialized` and `Failed` exist for records
//! seeded from upstream snapshots and for operator-marked failures; no
//! lifecycle event maps to them. The serialized form of each state is the
//! upstream SCREAMING_SNAKE_CASE wire format (`PAYMENT_PROCESSED` etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new `OrderId` from a string
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Current lifecycle state of an order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Order record exists but has not entered the lifecycle yet
    Initialized,
    /// Basket was created and the order registered
    Created,
    /// Order passed validation
    Validated,
    /// Payment completed for the order
    PaymentProcessed,
    /// Order left the warehouse
    Shipped,
    /// Order failed somewhere in the lifecycle
    Failed,
}

impl OrderState {
    /// Returns the upstream wire name for this state (e.g. `PAYMENT_PROCESSED`).
    #[must_use]
    pub const fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Initialized => "INITIALIZED",
            Self::Created => "CREATED",
            Self::Validated => "VALIDATED",
            Self::PaymentProcessed => "PAYMENT_PROCESSED",
            Self::Shipped => "SHIPPED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire_str())
    }
}

/// A single entry in the order projection.
///
/// Records are created when a basket is created (state [`OrderState::Created`])
/// and mutated only by the projection's apply policy. They are never deleted
/// during the process lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Unique order key
    pub order_id: OrderId,
    /// Current lifecycle state
    pub state: OrderState,
    /// When the state last changed
    pub last_updated: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a record in the given state, stamped with the current time.
    #[must_use]
    pub fn new(order_id: OrderId, state: OrderState) -> Self {
        Self {
            order_id,
            state,
            last_updated: Utc::now(),
        }
    }
}

/// A freshly created shopping basket as returned by the storefront.
///
/// Field names follow the storefront's camelCase wire format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    /// Order identifier assigned by the storefront
    pub id: String,
    /// Customer the basket belongs to
    pub customer_id: String,
    /// Lifecycle state at creation time (normally `CREATED`)
    pub state: OrderState,
    /// Product name
    pub product: String,
    /// Number of units ordered
    pub quantity: u32,
    /// Total price
    pub price: f64,
}
