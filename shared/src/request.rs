//! Service requests
//!
//! A customer-initiated, non-order interaction tied to a table: calling a
//! waiter, asking for the bill. Creation is rate-limited per table by the
//! server; nothing links a service request to an order.
//!
//! Status machine (same validation discipline as the order table):
//!
//! ```text
//! pending      → acknowledged, cancelled
//! acknowledged → completed
//! completed    → (terminal)
//! cancelled    → (terminal)
//! ```

use crate::order::status::UnknownStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the customer is asking for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceRequestKind {
    #[default]
    CallWaiter,
    RequestBill,
    /// Free-form request; the message field carries the ask
    Custom,
}

impl ServiceRequestKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceRequestKind::CallWaiter => "CALL_WAITER",
            ServiceRequestKind::RequestBill => "REQUEST_BILL",
            ServiceRequestKind::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for ServiceRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-request lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceRequestStatus {
    #[default]
    Pending,
    Acknowledged,
    Completed,
    Cancelled,
}

/// Every service-request status, for matrix tests and filters.
pub const ALL_REQUEST_STATUSES: [ServiceRequestStatus; 4] = [
    ServiceRequestStatus::Pending,
    ServiceRequestStatus::Acknowledged,
    ServiceRequestStatus::Completed,
    ServiceRequestStatus::Cancelled,
];

impl ServiceRequestStatus {
    /// The statuses legally reachable from `self`.
    pub const fn allowed_next(&self) -> &'static [ServiceRequestStatus] {
        match self {
            ServiceRequestStatus::Pending => &[
                ServiceRequestStatus::Acknowledged,
                ServiceRequestStatus::Cancelled,
            ],
            ServiceRequestStatus::Acknowledged => &[ServiceRequestStatus::Completed],
            ServiceRequestStatus::Completed | ServiceRequestStatus::Cancelled => &[],
        }
    }

    /// Whether `self → to` is in the table.
    pub fn can_transition_to(&self, to: ServiceRequestStatus) -> bool {
        self.allowed_next().contains(&to)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceRequestStatus::Completed | ServiceRequestStatus::Cancelled
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceRequestStatus::Pending => "PENDING",
            ServiceRequestStatus::Acknowledged => "ACKNOWLEDGED",
            ServiceRequestStatus::Completed => "COMPLETED",
            ServiceRequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ServiceRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceRequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_REQUEST_STATUSES
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// The durable service-request row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRequest {
    /// Request ID (uuid, assigned by the store)
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Table the customer is sitting at
    pub table_id: String,
    /// Table name, denormalized at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub kind: ServiceRequestKind,
    pub status: ServiceRequestStatus,
    /// Customer free text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Anonymous customer session, when the request came from the public menu
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Staff member who picked the request up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_by: Option<String>,
    /// Staff reply shown to the customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last transition timestamp
    pub status_changed_at: i64,
}

impl ServiceRequest {
    /// Record a validated transition. Legality is the caller's concern.
    pub fn apply_status(&mut self, to: ServiceRequestStatus, now: i64) {
        self.status = to;
        self.status_changed_at = now;
    }
}

/// Creation input, as sent from the customer-facing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub table_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default)]
    pub kind: ServiceRequestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}
