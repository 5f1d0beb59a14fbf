//! Change events pushed to live subscribers
//!
//! Every committed mutation emits one [`ChangeEvent`]. Events are thin
//! signals: tenant, entity id, new status. They never carry the full
//! entity, and they are not replayed; a consumer that reconnects after a
//! gap must re-fetch current state and treat later events as patches on
//! top of that baseline.

use crate::order::OrderStatus;
use crate::request::ServiceRequestStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What changed. Wire tokens are dotted `entity.action` strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.status_changed")]
    OrderStatusChanged,
    #[serde(rename = "order_item.status_changed")]
    OrderItemStatusChanged,
    #[serde(rename = "service_request.created")]
    ServiceRequestCreated,
    #[serde(rename = "service_request.status_changed")]
    ServiceRequestStatusChanged,
}

/// Every event kind, for subscription filters and tests.
pub const ALL_EVENT_KINDS: [EventKind; 5] = [
    EventKind::OrderCreated,
    EventKind::OrderStatusChanged,
    EventKind::OrderItemStatusChanged,
    EventKind::ServiceRequestCreated,
    EventKind::ServiceRequestStatusChanged,
];

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::OrderCreated => "order.created",
            EventKind::OrderStatusChanged => "order.status_changed",
            EventKind::OrderItemStatusChanged => "order_item.status_changed",
            EventKind::ServiceRequestCreated => "service_request.created",
            EventKind::ServiceRequestStatusChanged => "service_request.status_changed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown event kind token.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_EVENT_KINDS
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// One change notification, as delivered to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    /// Owning tenant; routing key for fan-out, never crosses tenants
    pub tenant_id: String,
    pub kind: EventKind,
    /// Id of the mutated entity (order, order item or service request)
    pub entity_id: String,
    /// Parent order, set on item events so consumers know which order to
    /// re-fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// New status token of the entity after the mutation
    pub status: String,
    /// Server timestamp of the mutation (Unix millis)
    pub at: i64,
}

impl ChangeEvent {
    pub fn order_created(tenant_id: &str, order_id: &str, status: OrderStatus, at: i64) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            kind: EventKind::OrderCreated,
            entity_id: order_id.to_string(),
            order_id: None,
            status: status.as_str().to_string(),
            at,
        }
    }

    pub fn order_status_changed(
        tenant_id: &str,
        order_id: &str,
        status: OrderStatus,
        at: i64,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            kind: EventKind::OrderStatusChanged,
            entity_id: order_id.to_string(),
            order_id: None,
            status: status.as_str().to_string(),
            at,
        }
    }

    pub fn order_item_status_changed(
        tenant_id: &str,
        item_id: &str,
        order_id: &str,
        status: OrderStatus,
        at: i64,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            kind: EventKind::OrderItemStatusChanged,
            entity_id: item_id.to_string(),
            order_id: Some(order_id.to_string()),
            status: status.as_str().to_string(),
            at,
        }
    }

    pub fn service_request_created(
        tenant_id: &str,
        request_id: &str,
        status: ServiceRequestStatus,
        at: i64,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            kind: EventKind::ServiceRequestCreated,
            entity_id: request_id.to_string(),
            order_id: None,
            status: status.as_str().to_string(),
            at,
        }
    }

    pub fn service_request_status_changed(
        tenant_id: &str,
        request_id: &str,
        status: ServiceRequestStatus,
        at: i64,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            kind: EventKind::ServiceRequestStatusChanged,
            entity_id: request_id.to_string(),
            order_id: None,
            status: status.as_str().to_string(),
            at,
        }
    }
}
