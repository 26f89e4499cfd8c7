//! In-memory store implementations
//!
//! A single [`MemoryStore`] implements all three store contracts with the
//! same observable semantics as the Postgres backend, including the
//! (sku, store) uniqueness constraint and last-write-wins bulk upserts.
//! Used by the test suites; also handy for running the server without a
//! database.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use stockflow_common::types::{
    Ingestion, IngestionErrorRow, IngestionStatus, InventoryRow, NewIngestionError,
    NewInventoryRow,
};

use super::{
    IngestionErrorPatch, IngestionErrorStore, IngestionStore, InventoryPatch, InventoryStore,
    StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Inner {
    inventory: Vec<InventoryRow>,
    next_inventory_id: i64,
    ingestions: Vec<Ingestion>,
    next_ingestion_id: i64,
    errors: Vec<IngestionErrorRow>,
    next_error_id: i64,
}

/// Shared in-process backend for all three store contracts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<InventoryRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.inventory.clone();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<InventoryRow>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.inventory.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_sku_and_store(
        &self,
        sku: &str,
        store: &str,
    ) -> StoreResult<Option<InventoryRow>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .inventory
            .iter()
            .find(|r| r.sku == sku && r.store == store)
            .cloned())
    }

    async fn insert(&self, row: &NewInventoryRow) -> StoreResult<InventoryRow> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .inventory
            .iter()
            .any(|r| r.sku == row.sku && r.store == row.store)
        {
            return Err(StoreError::duplicate(
                "Inventory row",
                &format!("{}/{}", row.sku, row.store),
            ));
        }
        inner.next_inventory_id += 1;
        let stored = InventoryRow {
            id: inner.next_inventory_id,
            sku: row.sku.clone(),
            description: row.description.clone(),
            store: row.store.clone(),
            quantity: row.quantity,
            last_upload: row.last_upload,
            ingestion_id: row.ingestion_id,
        };
        inner.inventory.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, patch: &InventoryPatch) -> StoreResult<Option<InventoryRow>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.inventory.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(ref description) = patch.description {
            row.description = description.clone();
        }
        if let Some(quantity) = patch.quantity {
            row.quantity = quantity;
        }
        if let Some(last_upload) = patch.last_upload {
            row.last_upload = last_upload;
        }
        if let Some(ingestion_id) = patch.ingestion_id {
            row.ingestion_id = ingestion_id;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.inventory.retain(|r| r.id != id);
        Ok(())
    }

    async fn bulk_upsert(&self, rows: &[NewInventoryRow]) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            if let Some(existing) = inner
                .inventory
                .iter_mut()
                .find(|r| r.sku == row.sku && r.store == row.store)
            {
                existing.description = row.description.clone();
                existing.quantity = row.quantity;
                existing.last_upload = row.last_upload;
                existing.ingestion_id = row.ingestion_id;
            } else {
                inner.next_inventory_id += 1;
                let id = inner.next_inventory_id;
                inner.inventory.push(InventoryRow {
                    id,
                    sku: row.sku.clone(),
                    description: row.description.clone(),
                    store: row.store.clone(),
                    quantity: row.quantity,
                    last_upload: row.last_upload,
                    ingestion_id: row.ingestion_id,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionStore for MemoryStore {
    async fn create(&self, total_rows: i64) -> StoreResult<Ingestion> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_ingestion_id += 1;
        let ingestion = Ingestion {
            id: inner.next_ingestion_id,
            created_at: Utc::now(),
            status: IngestionStatus::Processing,
            total_rows: Some(total_rows),
            error_count: None,
        };
        inner.ingestions.push(ingestion.clone());
        Ok(ingestion)
    }

    async fn find_all(&self) -> StoreResult<Vec<Ingestion>> {
        let inner = self.inner.lock().unwrap();
        let mut rows = inner.ingestions.clone();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Ingestion>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.ingestions.iter().find(|r| r.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: i64,
        status: IngestionStatus,
        error_count: Option<i64>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ingestion) = inner.ingestions.iter_mut().find(|r| r.id == id) {
            ingestion.status = status;
            if error_count.is_some() {
                ingestion.error_count = error_count;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionErrorStore for MemoryStore {
    async fn find_by_ingestion(&self, ingestion_id: i64) -> StoreResult<Vec<IngestionErrorRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<_> = inner
            .errors
            .iter()
            .filter(|r| r.ingestion_id == ingestion_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.row_number);
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<IngestionErrorRow>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.errors.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, row: &NewIngestionError) -> StoreResult<IngestionErrorRow> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_error_id += 1;
        let stored = IngestionErrorRow {
            id: inner.next_error_id,
            ingestion_id: row.ingestion_id,
            row_number: row.row_number,
            error_msg: row.error_msg.clone(),
            raw_data: row.raw_data.clone(),
        };
        inner.errors.push(stored.clone());
        Ok(stored)
    }

    async fn bulk_insert(&self, rows: &[NewIngestionError]) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            inner.next_error_id += 1;
            let id = inner.next_error_id;
            inner.errors.push(IngestionErrorRow {
                id,
                ingestion_id: row.ingestion_id,
                row_number: row.row_number,
                error_msg: row.error_msg.clone(),
                raw_data: row.raw_data.clone(),
            });
        }
        Ok(())
    }

    async fn update(
        &self,
        id: i64,
        patch: &IngestionErrorPatch,
    ) -> StoreResult<Option<IngestionErrorRow>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.errors.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(ingestion_id) = patch.ingestion_id {
            row.ingestion_id = ingestion_id;
        }
        if let Some(row_number) = patch.row_number {
            row.row_number = row_number;
        }
        if let Some(ref error_msg) = patch.error_msg {
            row.error_msg = error_msg.clone();
        }
        if let Some(ref raw_data) = patch.raw_data {
            row.raw_data = raw_data.clone();
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.errors.retain(|r| r.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_row(sku: &str, store: &str, quantity: i64) -> NewInventoryRow {
        NewInventoryRow {
            sku: sku.to_string(),
            description: Some("widget".to_string()),
            store: store.to_string(),
            quantity,
            last_upload: Utc::now(),
            ingestion_id: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_natural_key() {
        let store = MemoryStore::new();
        InventoryStore::insert(&store, &new_row("UK-1", "KEN", 5))
            .await
            .unwrap();
        let err = InventoryStore::insert(&store, &new_row("UK-1", "KEN", 9))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_bulk_upsert_overwrites_existing() {
        let store = MemoryStore::new();
        store.bulk_upsert(&[new_row("UK-1", "KEN", 5)]).await.unwrap();
        store.bulk_upsert(&[new_row("UK-1", "KEN", 9)]).await.unwrap();

        let rows = InventoryStore::find_all(&store).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 9);
    }

    #[tokio::test]
    async fn test_bulk_upsert_same_batch_last_wins() {
        let store = MemoryStore::new();
        store
            .bulk_upsert(&[new_row("UK-1", "KEN", 5), new_row("UK-1", "KEN", 7)])
            .await
            .unwrap();

        let rows = InventoryStore::find_all(&store).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_errors_ordered_by_row_number() {
        let store = MemoryStore::new();
        for n in [3, 1, 2] {
            IngestionErrorStore::insert(
                &store,
                &NewIngestionError {
                    ingestion_id: 1,
                    row_number: n,
                    error_msg: "bad".to_string(),
                    raw_data: serde_json::Map::new(),
                },
            )
            .await
            .unwrap();
        }
        let rows = store.find_by_ingestion(1).await.unwrap();
        let numbers: Vec<_> = rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ingestion_lifecycle() {
        let store = MemoryStore::new();
        let ingestion = store.create(4).await.unwrap();
        assert_eq!(ingestion.status, IngestionStatus::Processing);
        assert_eq!(ingestion.total_rows, Some(4));
        assert_eq!(ingestion.error_count, None);

        store
            .update_status(ingestion.id, IngestionStatus::Error, Some(2))
            .await
            .unwrap();
        let fetched = IngestionStore::find_by_id(&store, ingestion.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.status, IngestionStatus::Error);
        assert_eq!(fetched.error_count, Some(2));
    }
}
