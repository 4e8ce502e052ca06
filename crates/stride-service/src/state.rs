//! Application state shared across handlers.

use std::sync::Arc;

use stride_core::{SharedClock, SystemClock};
use stride_store::Store;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The data store (wrapped in Mutex for thread-safe access).
    pub store: Mutex<Store>,
    /// Configuration (RwLock for runtime updates).
    pub config: RwLock<Config>,
    /// Source of "now" for analytics and health responses.
    pub clock: SharedClock,
}

impl AppState {
    /// Create new application state reading the system clock.
    pub fn new(store: Store, config: Config) -> Arc<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create new application state reading the given clock.
    pub fn with_clock(store: Store, config: Config, clock: SharedClock) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            config: RwLock::new(config),
            clock,
        })
    }
}
