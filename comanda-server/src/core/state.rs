use std::sync::Arc;

use crate::core::Config;
use crate::orders::{OrderService, OrderStore};
use crate::realtime::EventHub;

/// Server state shared across all handlers.
///
/// Cloning is shallow; every component hands out `Arc`-backed handles.
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | Immutable configuration |
/// | store | redb persistence |
/// | hub | Change-event fan-out |
/// | service | The write path (store + hub) |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub store: OrderStore,
    pub hub: EventHub,
    pub service: OrderService,
}

impl ServerState {
    /// Build state over an already-open store. Tests pass an in-memory one.
    pub fn with_store(config: Config, store: OrderStore) -> Self {
        let hub = EventHub::new(config.event_buffer_size);
        let service = OrderService::new(store.clone(), hub.clone(), &config);
        Self {
            config: Arc::new(config),
            store,
            hub,
            service,
        }
    }

    /// Initialize for production use:
    ///
    /// 1. ensure the working directory exists
    /// 2. open (or create) the database under it
    /// 3. wire hub and service
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = OrderStore::open(config.database_path())?;
        Ok(Self::with_store(config.clone(), store))
    }
}
