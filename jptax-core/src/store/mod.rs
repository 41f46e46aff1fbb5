//! Snapshot persistence seams: the storage contract plus backend
//! registration.

pub mod factory;
pub mod repository;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use repository::{SnapshotStore, StoreError};
