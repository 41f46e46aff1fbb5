pub mod calculations;
pub mod format;
pub mod models;
pub mod rules;
pub mod sample;
pub mod store;
pub mod validation;

pub use calculations::engine::calculate_all;
pub use models::*;
pub use store::repository::{SnapshotStore, StoreError};
