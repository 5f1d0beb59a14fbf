//! Shared types for the Comanda order pipeline
//!
//! Common types used by the server and by typed clients: order and
//! service-request models with their status machines, change events,
//! error types and the API response envelope.

pub mod error;
pub mod event;
pub mod order;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ALL_ERROR_CODES, AppError, AppResult, ErrorCode};
pub use event::{ALL_EVENT_KINDS, ChangeEvent, EventKind};
pub use order::{
    ACTIVE_STATUSES, ALL_STATUSES, ItemModifier, NewOrder, NewOrderItem, Order, OrderDetail,
    OrderItem, OrderStatus, OrderType, PaymentStatus,
};
pub use request::{
    ALL_REQUEST_STATUSES, NewServiceRequest, ServiceRequest, ServiceRequestKind,
    ServiceRequestStatus,
};
pub use response::{ApiResponse, PaginatedResponse, Pagination};
