//! Order and order-item rows
//!
//! These are the durable shapes the store persists and the API returns.
//! Product data inside an item is a snapshot copied at creation time, so
//! later catalog edits never rewrite history. Money fields are plain f64 on
//! the wire; all arithmetic happens in decimal before landing here.

use serde::{Deserialize, Serialize};

use super::status::{OrderStatus, OrderType, PaymentStatus};

/// One customer transaction. Never hard-deleted; terminal rows stay for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (uuid, assigned by the store)
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Human-readable number, monotonically increasing per tenant
    pub order_number: u64,
    /// Table reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    /// Table name, denormalized at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Dine-in / takeaway / delivery
    pub order_type: OrderType,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Payment axis, independent of status
    pub payment_status: PaymentStatus,
    /// Sum of unit price times quantity across items, before modifiers
    pub subtotal: f64,
    /// Sum of modifier prices across items
    pub modifiers_total: f64,
    /// Order-level discounts
    pub discount_total: f64,
    /// subtotal + modifiers_total - discount_total, fixed at creation
    pub total_amount: f64,
    /// ISO 4217 code
    pub currency: String,
    /// Customer identity, all optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Staff member the order is assigned to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Internal staff notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last transition timestamp
    pub status_changed_at: i64,
    /// Actor of the last transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_changed_by: Option<String>,
    /// First entry into each status, set exactly once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparing_at: Option<i64>,
    /// Kitchen estimate, set via its own operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    /// Actor who cancelled, present iff cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    /// Set by the cancel operation, which requires a non-empty reason;
    /// absent when cancellation came through the plain status route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl Order {
    /// Record a validated transition: status, provenance, and the
    /// status-specific timestamp (first entry only).
    ///
    /// Legality is the caller's responsibility; this only stamps fields.
    pub fn apply_status(&mut self, to: OrderStatus, actor: &str, now: i64) {
        self.status = to;
        self.status_changed_at = now;
        self.status_changed_by = Some(actor.to_string());
        stamp_first_entry(self.status_slot_mut(to), now);
    }

    /// When the order first entered `status`, if it ever did.
    pub fn status_entered_at(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::Pending => Some(self.created_at),
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.preparing_at,
            OrderStatus::Ready => self.actual_ready_at,
            OrderStatus::Served => self.served_at,
            OrderStatus::Completed => self.completed_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    fn status_slot_mut(&mut self, status: OrderStatus) -> Option<&mut Option<i64>> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some(&mut self.confirmed_at),
            OrderStatus::Preparing => Some(&mut self.preparing_at),
            OrderStatus::Ready => Some(&mut self.actual_ready_at),
            OrderStatus::Served => Some(&mut self.served_at),
            OrderStatus::Completed => Some(&mut self.completed_at),
            OrderStatus::Cancelled => Some(&mut self.cancelled_at),
        }
    }
}

/// One selected modifier on a line item, e.g. `{"Size", "Large", 1.50}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemModifier {
    /// Modifier group, e.g. "Size"
    pub name: String,
    /// Chosen option, e.g. "Large"
    pub option: String,
    /// Price delta for this option
    pub price: f64,
}

/// One line within an order. Progresses through the same status machine as
/// its parent, but independently: all items reaching READY never auto-moves
/// the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Item ID (uuid, assigned by the store)
    pub id: String,
    /// Parent order
    pub order_id: String,
    /// Owning tenant (same as the parent's)
    pub tenant_id: String,
    /// Catalog reference, informational only after creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Product name snapshot
    pub name: String,
    /// Product description snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product image snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
    /// Unit price locked at creation; never re-read from the catalog
    pub unit_price: f64,
    /// Price-ledger entry that produced `unit_price`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_entry_id: Option<String>,
    /// Selected modifiers, order preserved
    #[serde(default)]
    pub modifiers: Vec<ItemModifier>,
    /// Sum of modifier prices (per unit)
    pub modifiers_total: f64,
    /// (unit_price + modifiers_total) * quantity
    pub line_total: f64,
    /// Customer free text ("no onions")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    /// Item lifecycle status
    pub status: OrderStatus,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last transition timestamp
    pub status_changed_at: i64,
    /// First entry into each status, set exactly once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparing_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

impl OrderItem {
    /// Record a validated transition on this item. Items carry no actor;
    /// provenance lives on the order.
    pub fn apply_status(&mut self, to: OrderStatus, now: i64) {
        self.status = to;
        self.status_changed_at = now;
        stamp_first_entry(self.status_slot_mut(to), now);
    }

    /// When the item first entered `status`, if it ever did.
    pub fn status_entered_at(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::Pending => Some(self.created_at),
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.preparing_at,
            OrderStatus::Ready => self.actual_ready_at,
            OrderStatus::Served => self.served_at,
            OrderStatus::Completed => self.completed_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    fn status_slot_mut(&mut self, status: OrderStatus) -> Option<&mut Option<i64>> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some(&mut self.confirmed_at),
            OrderStatus::Preparing => Some(&mut self.preparing_at),
            OrderStatus::Ready => Some(&mut self.actual_ready_at),
            OrderStatus::Served => Some(&mut self.served_at),
            OrderStatus::Completed => Some(&mut self.completed_at),
            OrderStatus::Cancelled => Some(&mut self.cancelled_at),
        }
    }
}

fn stamp_first_entry(slot: Option<&mut Option<i64>>, now: i64) {
    if let Some(slot) = slot
        && slot.is_none()
    {
        *slot = Some(now);
    }
}

/// An order together with all of its items, as returned by the detail fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
