//! Application error type
//!
//! [`AppError`] is the one error that crosses the API boundary. Every variant
//! maps to an [`ErrorCode`] token plus an HTTP status; the `IntoResponse` impl
//! renders the standard `{success, message, data?, errorCode?}` envelope.
//!
//! Storage and internal error text is logged, never echoed to clients.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::error::ErrorCode;
use crate::order::OrderStatus;
use crate::request::ServiceRequestStatus;
use crate::response::ApiResponse;

/// Result alias used by handlers and services.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Input errors ==========
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    // ========== Lifecycle errors ==========
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Bulk item update rejected because some items cannot reach the target.
    #[error("{} item(s) cannot change status to {to}", invalid.len())]
    BulkTransition {
        to: OrderStatus,
        /// Ids of the items whose current status cannot reach `to`.
        invalid: Vec<String>,
    },

    /// Cancellation requested for an order past the point of no return.
    #[error("order in status {status} can no longer be cancelled")]
    NotCancellable { status: OrderStatus },

    /// Same discipline for the service-request machine.
    #[error("cannot change service request status from {from} to {to}")]
    RequestTransition {
        from: ServiceRequestStatus,
        to: ServiceRequestStatus,
    },

    #[error("{0}")]
    RateLimited(String),

    // ========== Upstream / system errors ==========
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("{0}")]
    Unknown(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `what` names the missing entity, e.g. `"order 1f3a…"`.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn request_transition(from: ServiceRequestStatus, to: ServiceRequestStatus) -> Self {
        Self::RequestTransition { from, to }
    }

    pub fn rate_limited() -> Self {
        Self::RateLimited("Too many requests for this table, please wait a few minutes".into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            AppError::InvalidTransition { .. }
            | AppError::BulkTransition { .. }
            | AppError::NotCancellable { .. }
            | AppError::RequestTransition { .. } => ErrorCode::InvalidStatusTransition,
            AppError::RateLimited(_) => ErrorCode::RateLimited,
            AppError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Unknown(_) => ErrorCode::UnknownError,
        }
    }

    /// Structured payload clients can act on, where one exists.
    ///
    /// Transition rejections carry the allowed-next set so the caller can
    /// self-correct; bulk rejections carry the offending item ids.
    fn client_data(&self) -> Option<serde_json::Value> {
        match self {
            AppError::InvalidTransition { from, to } => Some(json!({
                "current_status": from,
                "requested_status": to,
                "allowed_next": from.allowed_next(),
            })),
            AppError::BulkTransition { to, invalid } => Some(json!({
                "requested_status": to,
                "invalid_items": invalid,
            })),
            AppError::NotCancellable { status } => Some(json!({
                "current_status": status,
                "allowed_next": status.allowed_next(),
            })),
            AppError::RequestTransition { from, to } => Some(json!({
                "current_status": from,
                "requested_status": to,
                "allowed_next": from.allowed_next(),
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        // Internal failure text goes to the log, clients get the generic
        // message for the code.
        let message = match &self {
            AppError::Database(detail) => {
                error!(target: "storage", error = %detail, "database error");
                code.message().to_string()
            }
            AppError::Unknown(detail) => {
                error!(target: "internal", error = %detail, "unknown error");
                code.message().to_string()
            }
            _ => self.to_string(),
        };

        let body = ApiResponse::failure(code, message).with_data(self.client_data());

        (code.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            AppError::validation("bad").code(),
            ErrorCode::ValidationError
        );
        assert_eq!(AppError::not_found("order x").code(), ErrorCode::NotFound);
        assert_eq!(
            AppError::invalid_transition(OrderStatus::Pending, OrderStatus::Ready).code(),
            ErrorCode::InvalidStatusTransition
        );
        assert_eq!(
            AppError::NotCancellable {
                status: OrderStatus::Served
            }
            .code(),
            ErrorCode::InvalidStatusTransition
        );
        assert_eq!(AppError::rate_limited().code(), ErrorCode::RateLimited);
        assert_eq!(AppError::database("boom").code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_invalid_transition_carries_allowed_next() {
        let err = AppError::invalid_transition(OrderStatus::Confirmed, OrderStatus::Served);
        let data = err.client_data().unwrap();
        let allowed = data["allowed_next"].as_array().unwrap();
        assert_eq!(allowed.len(), 2);
        assert!(allowed.iter().any(|v| v == "PREPARING"));
        assert!(allowed.iter().any(|v| v == "CANCELLED"));
    }

    #[test]
    fn test_request_transition_carries_allowed_next() {
        let err = AppError::request_transition(
            ServiceRequestStatus::Completed,
            ServiceRequestStatus::Pending,
        );
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);
        let data = err.client_data().unwrap();
        assert!(data["allowed_next"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_bulk_transition_carries_offending_ids() {
        let err = AppError::BulkTransition {
            to: OrderStatus::Ready,
            invalid: vec!["item-1".into(), "item-2".into()],
        };
        let data = err.client_data().unwrap();
        assert_eq!(data["invalid_items"].as_array().unwrap().len(), 2);
        assert_eq!(err.to_string(), "2 item(s) cannot change status to READY");
    }

    #[test]
    fn test_database_error_message_is_generic() {
        // Raw storage text must never leak through Display of the response
        let err = AppError::database("redb: file corrupted at page 17");
        assert_eq!(err.code().message(), "Database error");
    }

    #[test]
    fn test_display() {
        let err = AppError::invalid_transition(OrderStatus::Pending, OrderStatus::Ready);
        assert_eq!(
            err.to_string(),
            "cannot change status from PENDING to READY"
        );
        assert_eq!(
            AppError::not_found("order abc").to_string(),
            "order abc not found"
        );
    }
}
