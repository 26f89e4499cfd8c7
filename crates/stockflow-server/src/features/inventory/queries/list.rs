use stockflow_common::types::InventoryRow;

use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct ListInventoryQuery;

#[derive(Debug, thiserror::Error)]
pub enum ListInventoryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// All inventory rows, ordered by id ascending.
#[tracing::instrument(skip(store, _query))]
pub async fn handle(
    store: &dyn InventoryStore,
    _query: ListInventoryQuery,
) -> Result<Vec<InventoryRow>, ListInventoryError> {
    Ok(store.find_all().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use stockflow_common::types::NewInventoryRow;

    #[tokio::test]
    async fn test_list_orders_by_id() {
        let store = MemoryStore::new();
        for sku in ["UK-2", "UK-1"] {
            InventoryStore::insert(
                &store,
                &NewInventoryRow {
                    sku: sku.to_string(),
                    description: None,
                    store: "KEN".to_string(),
                    quantity: 1,
                    last_upload: Utc::now(),
                    ingestion_id: 1,
                },
            )
            .await
            .unwrap();
        }
        let rows = handle(&store, ListInventoryQuery).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id < rows[1].id);
        assert_eq!(rows[0].sku, "UK-2");
    }
}
