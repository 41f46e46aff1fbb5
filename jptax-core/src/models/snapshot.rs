use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::TaxInput;
use super::output::{Derived, Summary};

/// Bumped when the persisted record shape changes incompatibly.
pub const SCHEMA_VERSION: i32 = 1;

/// A persisted what-if snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub id: i64,
    pub schema_version: i32,
    pub year: i32,
    pub name: String,
    pub input: TaxInput,
    pub summary: Summary,
    pub derived: Derived,
    /// Denormalized from `derived` so next-year estimates can chain
    /// without re-running the engine.
    pub previous_year_total_income: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new snapshots (no id or timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaveRecord {
    pub year: i32,
    pub name: String,
    pub input: TaxInput,
    pub summary: Summary,
    pub derived: Derived,
}
