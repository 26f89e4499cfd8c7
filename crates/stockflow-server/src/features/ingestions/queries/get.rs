use stockflow_common::types::Ingestion;

use crate::store::{IngestionStore, StoreError};

#[derive(Debug, Clone)]
pub struct GetIngestionQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetIngestionError {
    #[error("Ingestion {0} not found")]
    NotFound(i64),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store), fields(id = query.id))]
pub async fn handle(
    store: &dyn IngestionStore,
    query: GetIngestionQuery,
) -> Result<Ingestion, GetIngestionError> {
    store
        .find_by_id(query.id)
        .await?
        .ok_or(GetIngestionError::NotFound(query.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_get_returns_record() {
        let store = MemoryStore::new();
        let created = store.create(3).await.unwrap();
        let found = handle(&store, GetIngestionQuery { id: created.id })
            .await
            .unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = handle(&store, GetIngestionQuery { id: 7 }).await.unwrap_err();
        assert!(matches!(err, GetIngestionError::NotFound(7)));
    }
}
