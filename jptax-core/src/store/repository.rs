//! Storage contract for saved calculation snapshots.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewSaveRecord, SaveRecord};

/// Errors from snapshot storage backends.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the requested id.
    #[error("Record not found")]
    NotFound,
    /// Another record already uses the requested name.
    #[error("A record named '{0}' already exists")]
    DuplicateName(String),
    /// Query failure inside the backend.
    #[error("Database error: {0}")]
    Database(String),
    /// The backend could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The store configuration does not describe a usable backend.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage backend for calculation snapshots.
///
/// Listings return the most recently updated record first, ties broken
/// by higher id.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persists a new snapshot and returns it with id and timestamps
    /// assigned.
    async fn save(&self, record: NewSaveRecord) -> Result<SaveRecord, StoreError>;

    async fn get(&self, id: i64) -> Result<SaveRecord, StoreError>;

    async fn list(&self) -> Result<Vec<SaveRecord>, StoreError>;

    /// Renames a snapshot and bumps its updated timestamp.
    async fn rename(&self, id: i64, name: &str) -> Result<SaveRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Next free default name for the year, in the form
    /// `{year}年度_納税金額試算_{YYYYMMDD}-{NNN}`.
    async fn generate_name(&self, year: i32) -> Result<String, StoreError>;
}
