use stockflow_common::types::{InventoryRow, RawRow};

use crate::features::shared::validation::{validate_patch, RowValidationError};
use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Clone)]
pub struct UpdateInventoryCommand {
    pub id: i64,
    pub fields: RawRow,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateInventoryError {
    #[error("Field '{0}' is part of the natural key and cannot be updated")]
    ImmutableField(&'static str),
    #[error("{0}")]
    Validation(RowValidationError),
    #[error("Inventory row {0} not found")]
    NotFound(i64),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// sku and store identify the row; changing them via update is forbidden.
const IMMUTABLE_FIELDS: [&str; 2] = ["sku", "store"];

#[tracing::instrument(skip(store, command), fields(id = command.id))]
pub async fn handle(
    store: &dyn InventoryStore,
    command: UpdateInventoryCommand,
) -> Result<InventoryRow, UpdateInventoryError> {
    for field in IMMUTABLE_FIELDS {
        if command.fields.contains_key(field) {
            return Err(UpdateInventoryError::ImmutableField(field));
        }
    }

    let patch = validate_patch(&command.fields).map_err(UpdateInventoryError::Validation)?;

    // An empty patch is a deliberate no-op; the store returns the current row.
    let updated = store
        .update(command.id, &patch)
        .await?
        .ok_or(UpdateInventoryError::NotFound(command.id))?;

    tracing::info!(inventory_id = updated.id, "Inventory row updated");

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use serde_json::{json, Value};
    use stockflow_common::types::NewInventoryRow;

    fn fields(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    async fn seed(store: &MemoryStore) -> i64 {
        InventoryStore::insert(
            store,
            &NewInventoryRow {
                sku: "UK-1".to_string(),
                description: Some("widget".to_string()),
                store: "KEN".to_string(),
                quantity: 5,
                last_upload: Utc::now(),
                ingestion_id: 1,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let id = seed(&store).await;
        let command = UpdateInventoryCommand {
            id,
            fields: fields(json!({ "quantity": 11, "description": null })),
        };
        let updated = handle(&store, command).await.unwrap();
        assert_eq!(updated.quantity, 11);
        assert_eq!(updated.description, None);
        assert_eq!(updated.sku, "UK-1");
    }

    #[tokio::test]
    async fn test_update_rejects_natural_key_change() {
        let store = MemoryStore::new();
        let id = seed(&store).await;
        let command = UpdateInventoryCommand {
            id,
            fields: fields(json!({ "store": "BAT" })),
        };
        let err = handle(&store, command).await.unwrap_err();
        assert!(matches!(err, UpdateInventoryError::ImmutableField("store")));
    }

    #[tokio::test]
    async fn test_update_empty_patch_returns_current_row() {
        let store = MemoryStore::new();
        let id = seed(&store).await;
        let command = UpdateInventoryCommand {
            id,
            fields: RawRow::new(),
        };
        let row = handle(&store, command).await.unwrap();
        assert_eq!(row.quantity, 5);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let store = MemoryStore::new();
        let command = UpdateInventoryCommand {
            id: 99,
            fields: fields(json!({ "quantity": 1 })),
        };
        let err = handle(&store, command).await.unwrap_err();
        assert!(matches!(err, UpdateInventoryError::NotFound(99)));
    }
}
