//! Decoding of raw broker messages into typed lifecycle events.
//!
//! Routing follows the upstream topic naming convention: the first matching
//! substring wins, checked in the fixed priority `"order"`, `"payment"`,
//! `"shipment"`. Each event kind names the payload field that carries the
//! order key (`id` for validation events, `orderId` for the rest); a payload
//! missing that field fails closed instead of producing an empty key.
//!
//! Decoding is a pure function of `(topic, payload)`. It performs no I/O and
//! never acknowledges anything; the acknowledgment policy lives with the
//! consumer pipeline.

use crate::order::OrderId;
use crate::order::OrderState;
use serde_json::Value;
use thiserror::Error;

/// The kind of lifecycle fact a message carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The order passed validation.
    OrderValidated,
    /// Payment completed for the order.
    PaymentProcessed,
    /// The order left the warehouse.
    Shipped,
}

impl EventKind {
    /// The projection state this event moves an order to.
    #[must_use]
    pub const fn target_state(self) -> OrderState {
        match self {
            Self::OrderValidated => OrderState::Validated,
            Self::PaymentProcessed => OrderState::PaymentProcessed,
            Self::Shipped => OrderState::Shipped,
        }
    }

    /// The payload field carrying the order key for this kind.
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::OrderValidated => "id",
            Self::PaymentProcessed | Self::Shipped => "orderId",
        }
    }
}

/// A decoded domain fact about one order.
#[derive(Clone, Debug, PartialEq)]
pub struct LifecycleEvent {
    /// The order this event belongs to.
    pub order_id: OrderId,
    /// What happened.
    pub kind: EventKind,
    /// The full payload record, for consumers that need more than the key.
    pub payload: serde_json::Map<String, Value>,
}

/// Reasons a raw message cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload was empty or not valid text.
    #[error("empty or non-textual payload")]
    EmptyPayload,

    /// The payload was not a parsable record, or lacked the required key field.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The topic matched none of the routing substrings.
    #[error("unroutable topic: {0}")]
    UnroutableTopic(String),
}

impl DecodeError {
    /// Stable label for metrics, one per variant.
    #[must_use]
    pub const fn reason_label(&self) -> &'static str {
        match self {
            Self::EmptyPayload => "empty_payload",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::UnroutableTopic(_) => "unroutable_topic",
        }
    }
}

/// Decode a raw `(topic, payload)` pair into a [`LifecycleEvent`].
///
/// # Errors
///
/// Returns [`DecodeError::EmptyPayload`] for empty or non-UTF-8 payloads,
/// [`DecodeError::MalformedPayload`] for unparsable records or records missing
/// the kind's key field, and [`DecodeError::UnroutableTopic`] when the topic
/// matches none of the routing substrings.
pub fn decode(topic: &str, payload: &[u8]) -> Result<LifecycleEvent, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::EmptyPayload)?;
    if text.trim().is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;

    let kind = classify(topic).ok_or_else(|| DecodeError::UnroutableTopic(topic.to_string()))?;

    let record = value
        .as_object()
        .ok_or_else(|| DecodeError::MalformedPayload("payload is not a record".to_string()))?;

    let key_field = kind.key_field();
    let order_id = record
        .get(key_field)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            DecodeError::MalformedPayload(format!("missing or non-string field `{key_field}`"))
        })?;

    Ok(LifecycleEvent {
        order_id: OrderId::from(order_id),
        kind,
        payload: record.clone(),
    })
}

/// Route a topic to an event kind. First match wins, fixed priority.
fn classify(topic: &str) -> Option<EventKind> {
    if topic.contains("order") {
        Some(EventKind::OrderValidated)
    } else if topic.contains("payment") {
        Some(EventKind::PaymentProcessed)
    } else if topic.contains("shipment") {
        Some(EventKind::Shipped)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn routes_order_topics_to_validated() {
        let event = decode("orders/order.validated", br#"{"id":"42"}"#).unwrap();
        assert_eq!(event.kind, EventKind::OrderValidated);
        assert_eq!(event.order_id.as_str(), "42");
    }

    #[test]
    fn routes_payment_topics_via_order_id_field() {
        let event = decode("payments/payment.processed", br#"{"orderId":"42"}"#).unwrap();
        assert_eq!(event.kind, EventKind::PaymentProcessed);
        assert_eq!(event.order_id.as_str(), "42");
    }

    #[test]
    fn routes_shipment_topics_via_order_id_field() {
        let event = decode("shipments/shipment.shipped", br#"{"orderId":"42"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Shipped);
        assert_eq!(event.order_id.as_str(), "42");
    }

    #[test]
    fn order_substring_wins_over_payment() {
        // "payment-for-order" contains both substrings; "order" has priority.
        let event = decode("payment-for-order", br#"{"id":"42","orderId":"43"}"#).unwrap();
        assert_eq!(event.kind, EventKind::OrderValidated);
        assert_eq!(event.order_id.as_str(), "42");
    }

    #[test]
    fn unroutable_topic_is_rejected() {
        let err = decode("inventory/stock.adjusted", br#"{"id":"42"}"#).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnroutableTopic("inventory/stock.adjusted".to_string())
        );
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert_eq!(decode("orders/x", b"").unwrap_err(), DecodeError::EmptyPayload);
        assert_eq!(decode("orders/x", b"   ").unwrap_err(), DecodeError::EmptyPayload);
    }

    #[test]
    fn non_utf8_payload_is_rejected_as_empty() {
        assert_eq!(
            decode("orders/x", &[0xff, 0xfe, 0xfd]).unwrap_err(),
            DecodeError::EmptyPayload
        );
    }

    #[test]
    fn unparsable_payload_is_malformed() {
        let err = decode("orders/x", b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload(_)));
    }

    #[test]
    fn parse_failure_is_reported_before_routing() {
        // Malformed payload on an unroutable topic: parsing runs first.
        let err = decode("inventory/x", b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload(_)));
    }

    #[test]
    fn missing_key_field_is_malformed() {
        // A payment event with only `id` set: the required field is `orderId`.
        let err = decode("payments/x", br#"{"id":"42"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload(_)));
    }

    #[test]
    fn non_string_key_field_is_malformed() {
        let err = decode("orders/x", br#"{"id":42}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload(_)));
    }

    #[test]
    fn non_record_payload_is_malformed() {
        let err = decode("orders/x", br#"["42"]"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload(_)));
    }

    #[test]
    fn extra_payload_fields_are_preserved() {
        let event = decode(
            "shipments/shipment.shipped",
            br#"{"orderId":"42","tracking":"TRACK-1"}"#,
        )
        .unwrap();
        assert_eq!(event.payload["tracking"], "TRACK-1");
    }

    proptest! {
        #[test]
        fn topics_without_routing_substrings_are_unroutable(
            topic in "[a-np-z/._-]{0,40}"
        ) {
            // The generated alphabet excludes 'o', so none of the routing
            // substrings can appear.
            let result = decode(&topic, br#"{"id":"1"}"#);
            prop_assert_eq!(result.unwrap_err(), DecodeError::UnroutableTopic(topic));
        }

        #[test]
        fn any_non_empty_id_round_trips_through_decode(id in "[a-zA-Z0-9-]{1,32}") {
            let payload = serde_json::json!({ "id": id.clone() }).to_string();
            let event = decode("orders/order.validated", payload.as_bytes()).unwrap();
            prop_assert_eq!(event.order_id.as_str(), id.as_str());
        }
    }
}
