//! API response envelope
//!
//! Every endpoint answers with the same structure:
//!
//! ```json
//! {
//!     "success": true,
//!     "message": "Success",
//!     "data": { ... },
//!     "errorCode": "not_found"
//! }
//! ```
//!
//! `errorCode` is present only on failures and is one of the tokens in
//! [`crate::error::ErrorCode`]. Clients branch on it, not on `message`.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Unified response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = serde_json::Value> {
    /// Whether the operation took effect.
    pub success: bool,
    /// Human-readable, possibly localized. Never parse this.
    pub message: String,
    /// Payload on success; structured error context on some failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable failure code, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl<T> ApiResponse<T> {
    /// Successful response with payload.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: "Success".to_string(),
            data: Some(data),
            error_code: None,
        }
    }

    /// Successful response with payload and custom message.
    pub fn success_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error_code: None,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Failed response carrying a code token.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: Some(code),
        }
    }

    /// Attach structured error context (allowed-next sets, offending ids).
    pub fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }
}

/// Pagination metadata for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of matching items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64) as u32
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Paginated list payload, carried inside [`ApiResponse::data`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(page, per_page, total),
        }
    }
}
