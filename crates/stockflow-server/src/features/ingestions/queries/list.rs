use stockflow_common::types::Ingestion;

use crate::store::{IngestionStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct ListIngestionsQuery;

#[derive(Debug, thiserror::Error)]
pub enum ListIngestionsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store, _query))]
pub async fn handle(
    store: &dyn IngestionStore,
    _query: ListIngestionsQuery,
) -> Result<Vec<Ingestion>, ListIngestionsError> {
    Ok(store.find_all().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_list_orders_by_id() {
        let store = MemoryStore::new();
        store.create(1).await.unwrap();
        store.create(2).await.unwrap();
        let rows = handle(&store, ListIngestionsQuery).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id < rows[1].id);
    }
}
