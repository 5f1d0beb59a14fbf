//! Comanda Server - order fulfillment backend for restaurant tenants
//!
//! # Architecture
//!
//! The server owns the order lifecycle for every tenant on the platform:
//!
//! - **Orders** (`orders`): status machine, money arithmetic, redb store,
//!   service-request rate limiting
//! - **Realtime** (`realtime`): tenant-isolated change-event fan-out to
//!   WebSocket subscribers
//! - **HTTP API** (`api`): axum routers, request context, middleware
//!
//! # Module structure
//!
//! ```text
//! comanda-server/src/
//! ├── core/          # Config, state, server lifecycle
//! ├── orders/        # Store, service, limiter, money, query filters
//! ├── realtime/      # EventHub fan-out
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Logging, date helpers
//! ```

pub mod api;
pub mod core;
pub mod orders;
pub mod realtime;
pub mod utils;

// Re-export public types
pub use core::{Config, Server, ServerState};
pub use orders::{OrderService, OrderStore};
pub use realtime::EventHub;

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, build the config, and initialize logging from it.
///
/// Returns the config so startup reads the environment exactly once.
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    let log_dir = config
        .log_to_file
        .then(|| config.log_dir().to_string_lossy().into_owned());
    init_logger_with_file(Some(&config.log_level), log_dir.as_deref());
    config
}

pub fn print_banner() {
    println!(
        r#"
   ______                                 __
  / ____/___  ____ ___  ____ _____  ____/ /___ _
 / /   / __ \/ __ `__ \/ __ `/ __ \/ __  / __ `/
/ /___/ /_/ / / / / / / /_/ / / / / /_/ / /_/ /
\____/\____/_/ /_/ /_/\__,_/_/ /_/\__,_/\__,_/
    "#
    );
}
