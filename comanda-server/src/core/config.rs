use std::path::{Path, PathBuf};

/// Server configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/comanda | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | LOG_LEVEL | info | Log filter level |
/// | LOG_TO_FILE | false | Also write daily log files under WORK_DIR/logs |
/// | DEFAULT_CURRENCY | EUR | Currency applied when an order carries none |
/// | EVENT_BUFFER_SIZE | 64 | Per-subscriber event channel capacity |
/// | SERVICE_REQUEST_WINDOW_SECS | 300 | Sliding window for table service requests |
/// | SERVICE_REQUEST_MAX | 3 | Max service requests per table per window |
/// | MAX_PAGE_SIZE | 200 | Hard cap on per_page for list endpoints |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/comanda HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Log filter level
    pub log_level: String,
    /// Write daily log files in addition to stdout
    pub log_to_file: bool,

    // === Domain settings ===
    /// ISO 4217 code applied when order input carries no currency
    pub default_currency: String,
    /// Per-subscriber event channel capacity
    pub event_buffer_size: usize,
    /// Sliding window for table service requests (seconds)
    pub service_request_window_secs: u64,
    /// Max service requests per table within the window
    pub service_request_max: u32,
    /// Hard cap on per_page for list endpoints
    pub max_page_size: u32,
}

impl Config {
    /// Load the configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/comanda".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_to_file: std::env::var("LOG_TO_FILE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            default_currency: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "EUR".into()),
            event_buffer_size: std::env::var("EVENT_BUFFER_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
            service_request_window_secs: std::env::var("SERVICE_REQUEST_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            service_request_max: std::env::var("SERVICE_REQUEST_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            max_page_size: std::env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
        }
    }

    /// Override the deployment-specific settings, used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Database file inside the working directory.
    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.work_dir).join("orders.redb")
    }

    /// Log directory inside the working directory.
    pub fn log_dir(&self) -> PathBuf {
        Path::new(&self.work_dir).join("logs")
    }

    /// Sliding window length in milliseconds.
    pub fn service_request_window_ms(&self) -> i64 {
        (self.service_request_window_secs as i64).saturating_mul(1000)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
