use stockflow_common::types::IngestionErrorRow;

use crate::store::{IngestionErrorStore, StoreError};

#[derive(Debug, Clone)]
pub struct ListErrorsQuery {
    pub ingestion_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListErrorsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error rows for one ingestion, ordered by row_number ascending. An unknown
/// ingestion id yields an empty list rather than an error.
#[tracing::instrument(skip(store), fields(ingestion_id = query.ingestion_id))]
pub async fn handle(
    store: &dyn IngestionErrorStore,
    query: ListErrorsQuery,
) -> Result<Vec<IngestionErrorRow>, ListErrorsError> {
    Ok(store.find_by_ingestion(query.ingestion_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use stockflow_common::types::{NewIngestionError, RawRow};

    #[tokio::test]
    async fn test_list_filters_by_ingestion() {
        let store = MemoryStore::new();
        for (ingestion_id, row_number) in [(1, 2), (2, 1), (1, 1)] {
            IngestionErrorStore::insert(
                &store,
                &NewIngestionError {
                    ingestion_id,
                    row_number,
                    error_msg: "bad".to_string(),
                    raw_data: RawRow::new(),
                },
            )
            .await
            .unwrap();
        }

        let rows = handle(&store, ListErrorsQuery { ingestion_id: 1 }).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[1].row_number, 2);
    }

    #[tokio::test]
    async fn test_list_unknown_ingestion_is_empty() {
        let store = MemoryStore::new();
        let rows = handle(&store, ListErrorsQuery { ingestion_id: 9 }).await.unwrap();
        assert!(rows.is_empty());
    }
}
