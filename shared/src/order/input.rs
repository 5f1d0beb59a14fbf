//! Creation inputs
//!
//! What the caller supplies when placing an order. Prices and snapshots come
//! from upstream collaborators (catalog, price ledger) and are taken as given;
//! totals are computed server-side at creation.

use serde::{Deserialize, Serialize};

use super::model::ItemModifier;
use super::status::OrderType;

/// Order-level creation input. Items travel alongside in the same request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
    /// ISO 4217 code; server default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Order-level discount, already resolved upstream
    #[serde(default)]
    pub discount_total: f64,
}

/// One line-item creation input with its locked price and product snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewOrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Product name snapshot
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
    /// Locked unit price from the price ledger
    pub unit_price: f64,
    /// Ledger entry that produced the price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_entry_id: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<ItemModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}
