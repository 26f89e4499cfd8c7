//! Promote a corrected error row back into inventory
//!
//! Builds a candidate inventory row from the quarantined `raw_data`, runs it
//! through the full row validator, upserts it, and removes the quarantine
//! entry. The upsert and the removal are separate store calls; if the removal
//! fails the caller gets a distinguishable partial-success error because the
//! inventory write has already happened.

use serde::Serialize;
use serde_json::Value;

use stockflow_common::types::RawRow;

use crate::features::shared::validation::{validate_row, RowValidationError};
use crate::store::{IngestionErrorStore, InventoryStore, StoreError};

#[derive(Debug, Clone)]
pub struct PromoteErrorCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoteErrorResponse {
    pub error_id: i64,
    pub sku: String,
    pub store: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PromoteErrorError {
    #[error("Ingestion error {0} not found")]
    NotFound(i64),
    #[error("raw_data cannot be promoted: {0}")]
    DataShape(String),
    #[error("{0}")]
    Validation(RowValidationError),
    #[error("Row was promoted but the quarantine entry could not be removed: {source}")]
    Incomplete {
        error_id: i64,
        #[source]
        source: StoreError,
    },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(inventory, errors), fields(id = command.id))]
pub async fn handle(
    inventory: &dyn InventoryStore,
    errors: &dyn IngestionErrorStore,
    command: PromoteErrorCommand,
) -> Result<PromoteErrorResponse, PromoteErrorError> {
    let error_row = errors
        .find_by_id(command.id)
        .await?
        .ok_or(PromoteErrorError::NotFound(command.id))?;

    let candidate = build_candidate(&error_row.raw_data)?;
    let new_row = validate_row(&candidate, error_row.ingestion_id)
        .map_err(PromoteErrorError::Validation)?;

    inventory.bulk_upsert(std::slice::from_ref(&new_row)).await?;

    if let Err(source) = errors.delete(command.id).await {
        tracing::error!(
            error_id = command.id,
            "Promoted row upserted but quarantine cleanup failed: {source}"
        );
        return Err(PromoteErrorError::Incomplete {
            error_id: command.id,
            source,
        });
    }

    tracing::info!(
        error_id = command.id,
        sku = %new_row.sku,
        store = %new_row.store,
        "Ingestion error promoted to inventory"
    );

    Ok(PromoteErrorResponse {
        error_id: command.id,
        sku: new_row.sku,
        store: new_row.store,
        message: "Error row promoted to inventory".to_string(),
    })
}

/// The candidate row keeps the quarantined data's sku/store (coerced to
/// strings) and quantity, keeps description only when it is a string, and
/// stamps `last_upload` with the promotion time.
fn build_candidate(raw: &RawRow) -> Result<RawRow, PromoteErrorError> {
    let sku = raw
        .get("sku")
        .ok_or_else(|| PromoteErrorError::DataShape("sku is missing".to_string()))?;
    let store = raw
        .get("store")
        .ok_or_else(|| PromoteErrorError::DataShape("store is missing".to_string()))?;
    let quantity = raw
        .get("quantity")
        .ok_or_else(|| PromoteErrorError::DataShape("quantity is missing".to_string()))?;
    if !quantity.is_number() {
        return Err(PromoteErrorError::DataShape(
            "quantity is not numeric".to_string(),
        ));
    }

    let mut candidate = RawRow::new();
    candidate.insert("sku".to_string(), Value::String(coerce_string(sku)));
    candidate.insert("store".to_string(), Value::String(coerce_string(store)));
    candidate.insert("quantity".to_string(), quantity.clone());
    if let Some(description @ Value::String(_)) = raw.get("description") {
        candidate.insert("description".to_string(), description.clone());
    }
    candidate.insert(
        "last_upload".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    Ok(candidate)
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
