//! Order fulfillment module
//!
//! - **store**: redb-based persistence for orders, items and service requests
//! - **service**: the write path, combining store transactions with event fan-out
//! - **money**: decimal arithmetic for totals, computed once at creation
//! - **query**: list filters, sorting and pagination for the read paths
//! - **limiter**: sliding-window rate limit for table service requests
//!
//! # Data Flow
//!
//! ```text
//! Handler → OrderService → OrderStore (redb, one txn per mutation)
//!                │
//!                └─ after commit → EventHub → subscribers
//! ```

pub mod limiter;
pub mod money;
pub mod query;
pub mod service;
pub mod store;

// Re-exports
pub use limiter::SlidingWindow;
pub use query::{OrderFilter, ServiceRequestFilter, SortField, SortOrder};
pub use service::OrderService;
pub use store::OrderStore;
