use crate::store::{IngestionErrorStore, StoreError};

#[derive(Debug, Clone)]
pub struct DeleteErrorCommand {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteErrorError {
    #[error("Ingestion error {0} not found")]
    NotFound(i64),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store), fields(id = command.id))]
pub async fn handle(
    store: &dyn IngestionErrorStore,
    command: DeleteErrorCommand,
) -> Result<(), DeleteErrorError> {
    if store.find_by_id(command.id).await?.is_none() {
        return Err(DeleteErrorError::NotFound(command.id));
    }
    store.delete(command.id).await?;

    tracing::info!(error_id = command.id, "Ingestion error discarded");

    Ok(())
}
