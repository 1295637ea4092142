pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::sync::Arc;
use tracing::info;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{DeletedUser, SharedStore, Store};

use crate::config::{AppConfig, StoreBackend};

/// Build the store selected by configuration, migrating Postgres first when enabled.
pub async fn open_store(config: &AppConfig) -> Result<SharedStore, DatabaseError> {
    match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
