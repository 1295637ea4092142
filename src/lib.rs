pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{MemoryStore, SharedStore};
use crate::events::EventBus;

pub use app::app;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SharedStore,
    pub events: EventBus,
}

impl AppState {
    pub fn new(config: AppConfig, store: SharedStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
            events: EventBus::new(),
        }
    }

    /// Test-config state over an empty `MemoryStore`
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }
}
