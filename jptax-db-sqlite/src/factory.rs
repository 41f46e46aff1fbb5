//! Registers the SQLite backend with the store registry.

use std::sync::Arc;

use async_trait::async_trait;

use jptax_core::store::factory::{StoreConfig, StoreFactory};
use jptax_core::store::repository::{SnapshotStore, StoreError};

use crate::SqliteSnapshotStore;

/// Factory for the `sqlite` backend.
#[derive(Debug, Default)]
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn SnapshotStore>, StoreError> {
        let store = SqliteSnapshotStore::new(&config.connection_string)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Arc::new(store))
    }
}
