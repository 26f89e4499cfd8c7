use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Clone)]
pub struct DeleteInventoryCommand {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteInventoryError {
    #[error("Inventory row {0} not found")]
    NotFound(i64),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store), fields(id = command.id))]
pub async fn handle(
    store: &dyn InventoryStore,
    command: DeleteInventoryCommand,
) -> Result<(), DeleteInventoryError> {
    if store.find_by_id(command.id).await?.is_none() {
        return Err(DeleteInventoryError::NotFound(command.id));
    }
    store.delete(command.id).await?;

    tracing::info!(inventory_id = command.id, "Inventory row deleted");

    Ok(())
}
