//! SQLite-backed snapshot store.
//!
//! Snapshots keep their input and result payloads as JSON text columns;
//! money columns store decimal strings. Timestamps are RFC 3339 UTC
//! with fixed-width microseconds, so the textual `ORDER BY` over
//! `updated_at` matches chronological order.

mod factory;

pub use factory::SqliteStoreFactory;

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use jptax_core::models::{NewSaveRecord, SaveRecord, SCHEMA_VERSION};
use jptax_core::store::repository::{SnapshotStore, StoreError};

pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    /// Connects to the database URL and runs pending migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed to connect to {database_url}"))?;
        let store = Self::new_with_pool(pool).await;
        store.run_migrations().await?;
        Ok(store)
    }

    /// Wraps an existing pool without running migrations.
    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Raw row shape; JSON and decimal columns stay text until conversion.
#[derive(Debug, FromRow)]
struct SaveRecordRow {
    id: i64,
    schema_version: i64,
    year: i64,
    name: String,
    input_json: String,
    summary_json: String,
    derived_json: String,
    previous_year_total_income: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SaveRecordRow> for SaveRecord {
    type Error = StoreError;

    fn try_from(row: SaveRecordRow) -> Result<Self, Self::Error> {
        Ok(SaveRecord {
            id: row.id,
            schema_version: row.schema_version as i32,
            year: row.year as i32,
            name: row.name,
            input: serde_json::from_str(&row.input_json)
                .map_err(|e| StoreError::Database(format!("corrupt input payload: {e}")))?,
            summary: serde_json::from_str(&row.summary_json)
                .map_err(|e| StoreError::Database(format!("corrupt summary payload: {e}")))?,
            derived: serde_json::from_str(&row.derived_json)
                .map_err(|e| StoreError::Database(format!("corrupt derived payload: {e}")))?,
            previous_year_total_income: parse_decimal(&row.previous_year_total_income)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

fn parse_decimal(value: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(value)
        .map_err(|e| StoreError::Database(format!("invalid decimal '{value}': {e}")))
}

/// Accepts RFC 3339 first, then the space-separated forms SQLite's own
/// datetime functions produce.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Database(format!("invalid timestamp '{value}': {e}")))
}

fn now_string() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn map_name_error(err: sqlx::Error, name: &str) -> StoreError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        StoreError::DuplicateName(name.to_string())
    } else {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn save(&self, record: NewSaveRecord) -> Result<SaveRecord, StoreError> {
        let input_json = serde_json::to_string(&record.input)
            .map_err(|e| StoreError::Database(format!("failed to serialize input: {e}")))?;
        let summary_json = serde_json::to_string(&record.summary)
            .map_err(|e| StoreError::Database(format!("failed to serialize summary: {e}")))?;
        let derived_json = serde_json::to_string(&record.derived)
            .map_err(|e| StoreError::Database(format!("failed to serialize derived: {e}")))?;
        let previous_income = record.derived.total_income_general.to_string();
        let now = now_string();

        let result = sqlx::query(
            r#"
            INSERT INTO save_records
                (schema_version, year, name, input_json, summary_json, derived_json,
                 previous_year_total_income, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(SCHEMA_VERSION)
        .bind(record.year)
        .bind(&record.name)
        .bind(&input_json)
        .bind(&summary_json)
        .bind(&derived_json)
        .bind(&previous_income)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_name_error(err, &record.name))?;

        let id = result.last_insert_rowid();
        debug!(id, name = %record.name, "saved snapshot");
        self.get(id).await
    }

    async fn get(&self, id: i64) -> Result<SaveRecord, StoreError> {
        let row: Option<SaveRecordRow> =
            sqlx::query_as("SELECT * FROM save_records WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn list(&self) -> Result<Vec<SaveRecord>, StoreError> {
        let rows: Vec<SaveRecordRow> =
            sqlx::query_as("SELECT * FROM save_records ORDER BY updated_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;
        rows.into_iter().map(SaveRecord::try_from).collect()
    }

    async fn rename(&self, id: i64, name: &str) -> Result<SaveRecord, StoreError> {
        let now = now_string();
        let result = sqlx::query("UPDATE save_records SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| map_name_error(err, name))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM save_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        debug!(id, "deleted snapshot");
        Ok(())
    }

    async fn generate_name(&self, year: i32) -> Result<String, StoreError> {
        let prefix = format!(
            "{year}年度_納税金額試算_{}-",
            chrono::Local::now().format("%Y%m%d")
        );
        let pattern = format!("{prefix}%");
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM save_records WHERE name LIKE ?")
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        let next = names
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Ok(format!("{prefix}{next:03}"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use jptax_core::calculations::calculate_all;
    use jptax_core::sample;

    use super::*;

    async fn setup_test_db() -> SqliteSnapshotStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        let store = SqliteSnapshotStore::new_with_pool(pool).await;
        store.run_migrations().await.expect("migrations");
        store
    }

    fn record(year: i32, name: &str) -> NewSaveRecord {
        let input = sample::demo_input(year);
        let output = calculate_all(&input);
        NewSaveRecord {
            year,
            name: name.to_string(),
            input,
            summary: output.summary,
            derived: output.derived,
        }
    }

    // ==================== save and get ====================

    #[tokio::test]
    async fn save_assigns_id_and_timestamps() {
        let store = setup_test_db().await;

        let saved = store.save(record(2024, "first")).await.unwrap();

        assert!(saved.id > 0);
        assert_eq!(saved.schema_version, SCHEMA_VERSION);
        assert_eq!(saved.year, 2024);
        assert_eq!(saved.created_at, saved.updated_at);
        assert_eq!(saved.previous_year_total_income, dec!(6950000));
    }

    #[tokio::test]
    async fn save_round_trips_the_full_payload() {
        let store = setup_test_db().await;
        let new_record = record(2024, "round-trip");

        let saved = store.save(new_record.clone()).await.unwrap();
        let fetched = store.get(saved.id).await.unwrap();

        assert_eq!(fetched.input, new_record.input);
        assert_eq!(fetched.summary, new_record.summary);
        assert_eq!(fetched.derived, new_record.derived);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let store = setup_test_db().await;
        store.save(record(2024, "taken")).await.unwrap();

        let result = store.save(record(2024, "taken")).await;

        assert_eq!(result.err(), Some(StoreError::DuplicateName("taken".into())));
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let store = setup_test_db().await;

        let result = store.get(999).await;

        assert_eq!(result.err(), Some(StoreError::NotFound));
    }

    // ==================== list ====================

    #[tokio::test]
    async fn list_orders_by_most_recent_update() {
        let store = setup_test_db().await;
        let first = store.save(record(2024, "first")).await.unwrap();
        store.save(record(2024, "second")).await.unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);

        store.rename(first.id, "first again").await.unwrap();
        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["first again", "second"]);
    }

    // ==================== rename ====================

    #[tokio::test]
    async fn rename_bumps_the_updated_timestamp() {
        let store = setup_test_db().await;
        let saved = store.save(record(2024, "before")).await.unwrap();

        let renamed = store.rename(saved.id, "after").await.unwrap();

        assert_eq!(renamed.name, "after");
        assert!(renamed.updated_at > saved.updated_at);
        assert_eq!(renamed.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn rename_to_an_existing_name_fails() {
        let store = setup_test_db().await;
        store.save(record(2024, "one")).await.unwrap();
        let second = store.save(record(2024, "two")).await.unwrap();

        let result = store.rename(second.id, "one").await;

        assert_eq!(result.err(), Some(StoreError::DuplicateName("one".into())));
    }

    #[tokio::test]
    async fn rename_to_own_name_succeeds() {
        let store = setup_test_db().await;
        let saved = store.save(record(2024, "same")).await.unwrap();

        let renamed = store.rename(saved.id, "same").await.unwrap();

        assert_eq!(renamed.name, "same");
    }

    #[tokio::test]
    async fn rename_missing_returns_not_found() {
        let store = setup_test_db().await;

        let result = store.rename(999, "anything").await;

        assert_eq!(result.err(), Some(StoreError::NotFound));
    }

    // ==================== delete ====================

    #[tokio::test]
    async fn delete_removes_the_record() {
        let store = setup_test_db().await;
        let saved = store.save(record(2024, "doomed")).await.unwrap();

        store.delete(saved.id).await.unwrap();

        assert_eq!(store.get(saved.id).await.err(), Some(StoreError::NotFound));
        assert_eq!(store.delete(saved.id).await.err(), Some(StoreError::NotFound));
    }

    // ==================== name generation ====================

    #[tokio::test]
    async fn generated_names_count_up_within_a_day() {
        let store = setup_test_db().await;
        let today = chrono::Local::now().format("%Y%m%d").to_string();

        let first = store.generate_name(2024).await.unwrap();
        assert_eq!(first, format!("2024年度_納税金額試算_{today}-001"));

        store.save(record(2024, &first)).await.unwrap();
        let second = store.generate_name(2024).await.unwrap();
        assert_eq!(second, format!("2024年度_納税金額試算_{today}-002"));
    }

    #[tokio::test]
    async fn generated_names_continue_from_the_highest_number() {
        let store = setup_test_db().await;
        let today = chrono::Local::now().format("%Y%m%d").to_string();
        let gap_name = format!("2024年度_納税金額試算_{today}-007");
        store.save(record(2024, &gap_name)).await.unwrap();

        let next = store.generate_name(2024).await.unwrap();

        assert_eq!(next, format!("2024年度_納税金額試算_{today}-008"));
    }

    #[tokio::test]
    async fn generated_names_are_scoped_per_year() {
        let store = setup_test_db().await;
        let first = store.generate_name(2024).await.unwrap();
        store.save(record(2024, &first)).await.unwrap();

        let other_year = store.generate_name(2025).await.unwrap();

        assert!(other_year.starts_with("2025年度_"));
        assert!(other_year.ends_with("-001"));
    }
}
