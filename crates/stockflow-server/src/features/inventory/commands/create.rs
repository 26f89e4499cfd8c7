use serde_json::Value;

use stockflow_common::types::{InventoryRow, RawRow};

use crate::features::shared::validation::{validate_row, RowValidationError};
use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Clone)]
pub struct CreateInventoryCommand {
    pub row: RawRow,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateInventoryError {
    #[error("{0}")]
    Validation(RowValidationError),
    #[error("Inventory row for sku '{sku}' in store '{store}' already exists")]
    Conflict { sku: String, store: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store, command))]
pub async fn handle(
    store: &dyn InventoryStore,
    command: CreateInventoryCommand,
) -> Result<InventoryRow, CreateInventoryError> {
    let mut extra = Vec::new();
    let ingestion_id = match command.row.get("ingestion_id").and_then(Value::as_i64) {
        Some(id) if id > 0 => id,
        _ => {
            extra.push("ingestion_id must be a positive integer".to_string());
            0
        }
    };

    let new_row = match validate_row(&command.row, ingestion_id) {
        Ok(row) if extra.is_empty() => row,
        Ok(_) => {
            return Err(CreateInventoryError::Validation(RowValidationError {
                messages: extra,
            }))
        }
        Err(mut err) => {
            err.messages.extend(extra);
            return Err(CreateInventoryError::Validation(err));
        }
    };

    if store
        .find_by_sku_and_store(&new_row.sku, &new_row.store)
        .await?
        .is_some()
    {
        return Err(CreateInventoryError::Conflict {
            sku: new_row.sku,
            store: new_row.store,
        });
    }

    let created = store.insert(&new_row).await.map_err(|e| match e {
        // Lost the race between the existence check and the insert.
        StoreError::Duplicate(_) => CreateInventoryError::Conflict {
            sku: new_row.sku.clone(),
            store: new_row.store.clone(),
        },
        other => CreateInventoryError::Store(other),
    })?;

    tracing::info!(
        inventory_id = created.id,
        sku = %created.sku,
        store = %created.store,
        "Inventory row created"
    );

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn body(sku: &str, store: &str) -> RawRow {
        match json!({
            "sku": sku,
            "store": store,
            "quantity": 3,
            "last_upload": "2026-01-01",
            "ingestion_id": 1,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_create_inserts_valid_row() {
        let store = MemoryStore::new();
        let command = CreateInventoryCommand {
            row: body("UK-100", "KEN"),
        };
        let created = handle(&store, command).await.unwrap();
        assert_eq!(created.sku, "UK-100");
        assert_eq!(created.quantity, 3);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_row() {
        let store = MemoryStore::new();
        let mut row = body("NOT-UK", "KEN");
        row.remove("ingestion_id");
        let err = handle(&store, CreateInventoryCommand { row }).await.unwrap_err();
        let CreateInventoryError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert!(v.to_string().contains("sku"));
        assert!(v.to_string().contains("ingestion_id"));
    }

    #[tokio::test]
    async fn test_create_conflicts_on_existing_natural_key() {
        let store = MemoryStore::new();
        handle(&store, CreateInventoryCommand { row: body("UK-1", "BAT") })
            .await
            .unwrap();
        let err = handle(&store, CreateInventoryCommand { row: body("UK-1", "BAT") })
            .await
            .unwrap_err();
        assert!(matches!(err, CreateInventoryError::Conflict { .. }));
    }
}
