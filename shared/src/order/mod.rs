//! Order domain types
//!
//! - Status machine: the canonical transition table for orders and items
//! - Models: the durable rows (order, item, detail)
//! - Inputs: creation payloads with locked prices and product snapshots

pub mod input;
pub mod model;
pub mod status;

// Re-exports
pub use input::{NewOrder, NewOrderItem};
pub use model::{ItemModifier, Order, OrderDetail, OrderItem};
pub use status::{ACTIVE_STATUSES, ALL_STATUSES, OrderStatus, OrderType, PaymentStatus, UnknownStatus};
