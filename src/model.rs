//! Core domain types for the order stream.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Amount;

/// Order identifier, as assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// URL-safe unique identifier of a tenant store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreSlug(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("store slug is empty")]
    Empty,
    #[error("store slug '{0}' may only contain lowercase letters, digits and '-'")]
    InvalidChar(String),
    #[error("store slug '{0}' cannot start or end with '-'")]
    EdgeHyphen(String),
}

impl StoreSlug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StoreSlug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidChar(s.to_string()));
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(SlugError::EdgeHyphen(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for StoreSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of an order.
///
/// The regular sequence is `Received → Confirmed → Preparing → Ready →
/// Delivering → Delivered`. `Cancelled` is reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Received,
    Confirmed,
    Preparing,
    Ready,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position in the regular sequence; `None` for `Cancelled`.
    fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Received => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::Delivering => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The stage a status-advance action moves to.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Received => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivering),
            OrderStatus::Delivering => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: Amount,
}

impl OrderItem {
    pub fn subtotal(&self) -> Amount {
        self.price * self.quantity
    }
}

/// The customer who placed an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// An order as published by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(deserialize_with = "string_or_number")]
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub total: Amount,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Number of units across all items.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Order numbers arrive either as `42` or `"0042"`.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    })
}

/// Discriminant of a [`StreamEvent`], as carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewOrder,
    OrderUpdated,
    OrderCancelled,
}

impl EventKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "NEW_ORDER" => Some(EventKind::NewOrder),
            "ORDER_UPDATED" => Some(EventKind::OrderUpdated),
            "ORDER_CANCELLED" => Some(EventKind::OrderCancelled),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            EventKind::NewOrder => "NEW_ORDER",
            EventKind::OrderUpdated => "ORDER_UPDATED",
            EventKind::OrderCancelled => "ORDER_CANCELLED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A real-time notification about one order of a store.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A new order was placed.
    NewOrder {
        order: Order,
        timestamp: Option<DateTime<Utc>>,
    },
    /// An existing order changed (status, payment, items...).
    OrderUpdated {
        order: Order,
        timestamp: Option<DateTime<Utc>>,
    },
    /// An order was cancelled; only its id is needed.
    OrderCancelled {
        id: OrderId,
        timestamp: Option<DateTime<Utc>>,
    },
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::NewOrder { .. } => EventKind::NewOrder,
            StreamEvent::OrderUpdated { .. } => EventKind::OrderUpdated,
            StreamEvent::OrderCancelled { .. } => EventKind::OrderCancelled,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        match self {
            StreamEvent::NewOrder { order, .. } | StreamEvent::OrderUpdated { order, .. } => {
                &order.id
            }
            StreamEvent::OrderCancelled { id, .. } => id,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            StreamEvent::NewOrder { timestamp, .. }
            | StreamEvent::OrderUpdated { timestamp, .. }
            | StreamEvent::OrderCancelled { timestamp, .. } => *timestamp,
        }
    }
}

/// Errors that can occur when decoding an event payload.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} payload: {source}")]
    Payload {
        kind: EventKind,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct CancelledPayload {
    id: OrderId,
}

/// Decode the JSON data of one stream message.
///
/// Returns `Ok(None)` for event types this client does not know about.
pub fn parse_event(data: &str) -> Result<Option<StreamEvent>, EventError> {
    let raw: RawEvent = serde_json::from_str(data)?;
    let Some(kind) = EventKind::from_wire(&raw.kind) else {
        return Ok(None);
    };
    let timestamp = raw.timestamp;
    let payload_err = |source: serde_json::Error| EventError::Payload { kind, source };

    let event = match kind {
        EventKind::NewOrder => StreamEvent::NewOrder {
            order: serde_json::from_value(raw.payload).map_err(payload_err)?,
            timestamp,
        },
        EventKind::OrderUpdated => StreamEvent::OrderUpdated {
            order: serde_json::from_value(raw.payload).map_err(payload_err)?,
            timestamp,
        },
        EventKind::OrderCancelled => {
            let payload: CancelledPayload =
                serde_json::from_value(raw.payload).map_err(payload_err)?;
            StreamEvent::OrderCancelled {
                id: payload.id,
                timestamp,
            }
        }
    };
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "id": "o1",
        "orderNumber": 17,
        "status": "PREPARING",
        "paymentStatus": "PAID",
        "total": "31.80",
        "items": [
            {"name": "Pizza", "quantity": 2, "price": 12.9},
            {"name": "Soda", "quantity": 1, "price": 6}
        ],
        "customer": {"id": "c9", "name": "Ana", "phone": "5511999990000"},
        "createdAt": "2024-05-01T18:30:00.000Z"
    }"#;

    #[test]
    fn order_from_backend_json() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.id, OrderId::from("o1"));
        assert_eq!(order.order_number, "17");
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total, Amount::from_cents(3180));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items[0].subtotal(), Amount::from_cents(2580));
        assert_eq!(order.customer.as_ref().unwrap().id, "c9");
        assert!(order.created_at.is_some());
        assert!(order.updated_at.is_none());
    }

    #[test]
    fn order_defaults_optional_fields() {
        let order: Order = serde_json::from_str(
            r#"{"id":"o2","orderNumber":"A-7","status":"RECEIVED","total":0}"#,
        )
        .unwrap();
        assert_eq!(order.order_number, "A-7");
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.items.is_empty());
        assert!(order.customer.is_none());
    }

    #[test]
    fn unknown_payment_status_is_tolerated() {
        let order: Order = serde_json::from_str(
            r#"{"id":"o3","orderNumber":1,"status":"READY","paymentStatus":"CHARGEBACK","total":1}"#,
        )
        .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Unknown);
    }

    #[test]
    fn status_sequence_is_monotonic() {
        use OrderStatus::*;
        assert!(Received.can_transition_to(Confirmed));
        assert!(Received.can_transition_to(Ready));
        assert!(!Preparing.can_transition_to(Confirmed));
        assert!(!Ready.can_transition_to(Ready));
        assert!(Delivering.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Received));
    }

    #[test]
    fn status_next_walks_the_sequence() {
        let mut status = OrderStatus::Received;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            assert!(status.can_transition_to(next));
            status = next;
            seen.push(status);
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(status, OrderStatus::Delivered);
        assert!(status.is_terminal());
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn store_slug_validation() {
        assert_eq!("pizza-do-ze".parse::<StoreSlug>().unwrap().as_str(), "pizza-do-ze");
        assert_eq!("".parse::<StoreSlug>(), Err(SlugError::Empty));
        assert!(matches!(
            "Pizza".parse::<StoreSlug>(),
            Err(SlugError::InvalidChar(_))
        ));
        assert!(matches!(
            "a b".parse::<StoreSlug>(),
            Err(SlugError::InvalidChar(_))
        ));
        assert!(matches!(
            "-pizza".parse::<StoreSlug>(),
            Err(SlugError::EdgeHyphen(_))
        ));
    }

    #[test]
    fn parse_new_order_event() {
        let data = format!(
            r#"{{"type":"NEW_ORDER","payload":{ORDER_JSON},"timestamp":"2024-05-01T18:30:01Z"}}"#
        );
        let event = parse_event(&data).unwrap().unwrap();
        assert_eq!(event.kind(), EventKind::NewOrder);
        assert_eq!(event.order_id().as_str(), "o1");
        assert!(event.timestamp().is_some());
    }

    #[test]
    fn parse_cancelled_event_needs_only_id() {
        let event = parse_event(r#"{"type":"ORDER_CANCELLED","payload":{"id":"o1"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            StreamEvent::OrderCancelled {
                id: OrderId::from("o1"),
                timestamp: None,
            }
        );
    }

    #[test]
    fn parse_unknown_type_is_ignored() {
        let event = parse_event(r#"{"type":"HEARTBEAT","payload":{}}"#).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn parse_rejects_bad_payload() {
        let err = parse_event(r#"{"type":"ORDER_UPDATED","payload":{"id":"o1"}}"#).unwrap_err();
        assert!(matches!(
            err,
            EventError::Payload {
                kind: EventKind::OrderUpdated,
                ..
            }
        ));
        assert!(matches!(
            parse_event("not json").unwrap_err(),
            EventError::Json(_)
        ));
    }
}
