//! Backend registration for snapshot stores.
//!
//! A binary registers the factories it links in, then creates a store
//! from a [`StoreConfig`] naming one of them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::repository::{SnapshotStore, StoreError};

/// Backend selection plus its connection string.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Creates a snapshot store from a configuration.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    fn backend_name(&self) -> &str;

    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn SnapshotStore>, StoreError>;
}

/// Registry of linked-in store backends.
#[derive(Default)]
pub struct StoreRegistry {
    factories: HashMap<String, Arc<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn StoreFactory>) {
        self.factories
            .insert(factory.backend_name().to_string(), factory);
    }

    /// Registered backend names, sorted for stable listings.
    pub fn available_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn SnapshotStore>, StoreError> {
        let factory = self.factories.get(&config.backend).ok_or_else(|| {
            StoreError::Configuration(format!("unknown backend '{}'", config.backend))
        })?;
        factory.create(config).await
    }
}
