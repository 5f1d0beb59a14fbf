//! Unified error codes for the fulfillment pipeline
//!
//! Every mutation response carries at most one of these codes; clients branch
//! on the code token, never on message text (messages may be localized).
//!
//! Wire format is the lowercase snake_case token, e.g. `"invalid_status_transition"`.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable error code carried in the `errorCode` response field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Referenced entity absent
    NotFound,
    /// Unique constraint hit (duplicate id / order number)
    AlreadyExists,
    /// Malformed or out-of-range input, rejected before any storage access
    ValidationError,
    /// Propagated from the auth layer, never computed here
    PermissionDenied,
    /// Storage-layer failure
    DatabaseError,
    /// Requested status change not in the transition table
    InvalidStatusTransition,
    /// Service-request flood for one table
    RateLimited,
    /// Catch-all
    UnknownError,
}

/// All codes, in wire order. Used by tests and by clients generating
/// exhaustive match arms.
pub const ALL_ERROR_CODES: [ErrorCode; 8] = [
    ErrorCode::NotFound,
    ErrorCode::AlreadyExists,
    ErrorCode::ValidationError,
    ErrorCode::PermissionDenied,
    ErrorCode::DatabaseError,
    ErrorCode::InvalidStatusTransition,
    ErrorCode::RateLimited,
    ErrorCode::UnknownError,
];

impl ErrorCode {
    /// The wire token for this code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::InvalidStatusTransition => "invalid_status_transition",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::UnknownError => "unknown_error",
        }
    }

    /// Generic developer-facing English message for this code.
    ///
    /// Handlers usually attach a more specific message; this is the fallback.
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::ValidationError => "Validation failed",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::InvalidStatusTransition => "Status transition not allowed",
            ErrorCode::RateLimited => "Too many requests, please wait a few minutes",
            ErrorCode::UnknownError => "An unknown error occurred",
        }
    }

    /// HTTP status the API layer maps this code to.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InvalidStatusTransition => StatusCode::CONFLICT,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unrecognized code token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidErrorCode(pub String);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl FromStr for ErrorCode {
    type Err = InvalidErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_found" => Ok(ErrorCode::NotFound),
            "already_exists" => Ok(ErrorCode::AlreadyExists),
            "validation_error" => Ok(ErrorCode::ValidationError),
            "permission_denied" => Ok(ErrorCode::PermissionDenied),
            "database_error" => Ok(ErrorCode::DatabaseError),
            "invalid_status_transition" => Ok(ErrorCode::InvalidStatusTransition),
            "rate_limited" => Ok(ErrorCode::RateLimited),
            "unknown_error" => Ok(ErrorCode::UnknownError),
            other => Err(InvalidErrorCode(other.to_string())),
        }
    }
}
