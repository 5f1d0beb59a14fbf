//! Utility modules: logging setup and date helpers.

pub mod logger;
pub mod time;
