//! Store contracts for the ingestion pipeline
//!
//! The pipeline never talks to a database directly; it goes through these
//! traits. [`postgres`] is the production backend, [`memory`] is an
//! in-process backend with identical observable semantics used by the test
//! suite.
//!
//! Bulk operations are all-or-nothing per call: a failure aborts the whole
//! batch, and no partial-success reporting happens inside a single bulk call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockflow_common::types::{
    Ingestion, IngestionErrorRow, IngestionStatus, InventoryRow, NewIngestionError,
    NewInventoryRow, RawRow,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Unique constraint violation on a natural key
    #[error("{0}")]
    Duplicate(String),
}

impl StoreError {
    /// Create a duplicate error with resource context
    pub fn duplicate(resource_type: &str, identifier: &str) -> Self {
        Self::Duplicate(format!("{} '{}' already exists", resource_type, identifier))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Partial update of an inventory row.
///
/// `description` distinguishes "leave unchanged" (`None`) from "set to null"
/// (`Some(None)`). The natural key (sku, store) is immutable and therefore
/// not representable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryPatch {
    pub description: Option<Option<String>>,
    pub quantity: Option<i64>,
    pub last_upload: Option<DateTime<Utc>>,
    pub ingestion_id: Option<i64>,
}

impl InventoryPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.quantity.is_none()
            && self.last_upload.is_none()
            && self.ingestion_id.is_none()
    }
}

/// Partial update of a quarantined row. `raw_data` replaces the stored
/// object wholesale, it is not deep-merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionErrorPatch {
    pub ingestion_id: Option<i64>,
    pub row_number: Option<i64>,
    pub error_msg: Option<String>,
    pub raw_data: Option<RawRow>,
}

impl IngestionErrorPatch {
    pub fn is_empty(&self) -> bool {
        self.ingestion_id.is_none()
            && self.row_number.is_none()
            && self.error_msg.is_none()
            && self.raw_data.is_none()
    }
}

/// Owns inventory rows, keyed by id and by the (sku, store) natural key.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All rows, ordered by id ascending.
    async fn find_all(&self) -> StoreResult<Vec<InventoryRow>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<InventoryRow>>;

    async fn find_by_sku_and_store(
        &self,
        sku: &str,
        store: &str,
    ) -> StoreResult<Option<InventoryRow>>;

    /// Insert a single row; fails with [`StoreError::Duplicate`] if the
    /// (sku, store) pair already exists.
    async fn insert(&self, row: &NewInventoryRow) -> StoreResult<InventoryRow>;

    /// Apply a patch to a row; returns `None` if the id does not exist.
    /// An empty patch is a no-op returning the current row.
    async fn update(&self, id: i64, patch: &InventoryPatch) -> StoreResult<Option<InventoryRow>>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Batched insert-or-overwrite keyed by (sku, store). For duplicate keys
    /// within the same call the last occurrence wins. A no-op on empty input.
    async fn bulk_upsert(&self, rows: &[NewInventoryRow]) -> StoreResult<()>;
}

/// Owns ingestion batch records.
#[async_trait]
pub trait IngestionStore: Send + Sync {
    /// Create a record in `processing` state with `total_rows` set and
    /// `error_count` unset.
    async fn create(&self, total_rows: i64) -> StoreResult<Ingestion>;

    /// All records, ordered by id ascending.
    async fn find_all(&self) -> StoreResult<Vec<Ingestion>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Ingestion>>;

    async fn update_status(
        &self,
        id: i64,
        status: IngestionStatus,
        error_count: Option<i64>,
    ) -> StoreResult<()>;
}

/// Owns quarantined rows.
#[async_trait]
pub trait IngestionErrorStore: Send + Sync {
    /// All error rows for one ingestion, ordered by row_number ascending.
    async fn find_by_ingestion(&self, ingestion_id: i64) -> StoreResult<Vec<IngestionErrorRow>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<IngestionErrorRow>>;

    async fn insert(&self, row: &NewIngestionError) -> StoreResult<IngestionErrorRow>;

    /// Batched insert; a no-op on empty input.
    async fn bulk_insert(&self, rows: &[NewIngestionError]) -> StoreResult<()>;

    /// Apply a patch; returns `None` if the id does not exist. An empty
    /// patch is a no-op returning the current row.
    async fn update(
        &self,
        id: i64,
        patch: &IngestionErrorPatch,
    ) -> StoreResult<Option<IngestionErrorRow>>;

    async fn delete(&self, id: i64) -> StoreResult<()>;
}

/// Collapse duplicate (sku, store) pairs keeping the last occurrence.
///
/// Multi-row `INSERT ... ON CONFLICT` cannot touch the same row twice in one
/// statement, so the batch is pre-collapsed here; sequence order decides the
/// winner, which is the documented last-write-wins contract.
pub(crate) fn collapse_last_wins(rows: &[NewInventoryRow]) -> Vec<NewInventoryRow> {
    let mut by_key: Vec<NewInventoryRow> = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(existing) = by_key
            .iter_mut()
            .find(|r| r.sku == row.sku && r.store == row.store)
        {
            *existing = row.clone();
        } else {
            by_key.push(row.clone());
        }
    }
    by_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(sku: &str, store: &str, quantity: i64) -> NewInventoryRow {
        NewInventoryRow {
            sku: sku.to_string(),
            description: None,
            store: store.to_string(),
            quantity,
            last_upload: Utc::now(),
            ingestion_id: 1,
        }
    }

    #[test]
    fn test_collapse_keeps_last_occurrence() {
        let rows = vec![row("UK-1", "KEN", 5), row("UK-2", "BAT", 1), row("UK-1", "KEN", 9)];
        let collapsed = collapse_last_wins(&rows);
        assert_eq!(collapsed.len(), 2);
        let uk1 = collapsed.iter().find(|r| r.sku == "UK-1").unwrap();
        assert_eq!(uk1.quantity, 9);
    }

    #[test]
    fn test_collapse_distinguishes_stores() {
        let rows = vec![row("UK-1", "KEN", 5), row("UK-1", "BAT", 7)];
        assert_eq!(collapse_last_wins(&rows).len(), 2);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(InventoryPatch::default().is_empty());
        let patch = InventoryPatch {
            quantity: Some(3),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(IngestionErrorPatch::default().is_empty());
    }
}
