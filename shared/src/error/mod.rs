//! Error handling for the fulfillment pipeline
//!
//! - [`ErrorCode`] - wire-level code tokens
//! - [`AppError`] - application error with axum response mapping
//! - [`AppResult`] - handler/service result alias

pub mod codes;
pub mod types;

pub use codes::{ALL_ERROR_CODES, ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
