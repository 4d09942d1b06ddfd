use crate::{
    config::{StorageBackend, StorageConfig},
    error::RosterResult,
};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use std::{fmt::Debug, sync::Arc};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
#[cfg(test)]
pub use memory::FlakyStorage;
pub use postgres::PostgresStorage;

/// Durable string-keyed storage for the roster.
///
/// Every backend holds whole serialised documents: `set` replaces the value
/// for a key, `get` returns `None` for a key that was never written.
#[async_trait]
pub trait KeyValueStorage: Debug + Send + Sync {
    async fn get(&self, key: &str) -> RosterResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> RosterResult<()>;
}

pub async fn open_storage(config: &StorageConfig) -> RosterResult<Arc<dyn KeyValueStorage>> {
    Ok(match &config.backend {
        StorageBackend::Postgres(db_config) => {
            let options = PgPoolOptions::new().max_connections(5);
            Arc::new(PostgresStorage::new(options, db_config).await?)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, the roster will not survive a restart");
            Arc::new(MemoryStorage::default())
        }
    })
}
