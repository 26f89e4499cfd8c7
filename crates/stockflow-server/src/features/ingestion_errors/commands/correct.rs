use serde_json::Value;

use stockflow_common::types::{IngestionErrorRow, RawRow};

use crate::features::shared::validation::RowValidationError;
use crate::store::{IngestionErrorPatch, IngestionErrorStore, StoreError};

#[derive(Debug, Clone)]
pub struct CorrectErrorCommand {
    pub id: i64,
    pub fields: RawRow,
}

#[derive(Debug, thiserror::Error)]
pub enum CorrectErrorError {
    #[error("{0}")]
    Validation(RowValidationError),
    #[error("Ingestion error {0} not found")]
    NotFound(i64),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Merge the recognized fields over the stored error row. `raw_data` is
/// replaced wholesale rather than deep-merged. An empty patch returns the
/// current row unchanged.
#[tracing::instrument(skip(store, command), fields(id = command.id))]
pub async fn handle(
    store: &dyn IngestionErrorStore,
    command: CorrectErrorCommand,
) -> Result<IngestionErrorRow, CorrectErrorError> {
    let patch = build_patch(&command.fields).map_err(CorrectErrorError::Validation)?;

    let updated = store
        .update(command.id, &patch)
        .await?
        .ok_or(CorrectErrorError::NotFound(command.id))?;

    tracing::info!(error_id = updated.id, "Ingestion error corrected");

    Ok(updated)
}

fn build_patch(fields: &RawRow) -> Result<IngestionErrorPatch, RowValidationError> {
    let mut messages = Vec::new();
    let mut patch = IngestionErrorPatch::default();

    if let Some(value) = fields.get("error_msg") {
        match value {
            Value::String(s) => patch.error_msg = Some(s.clone()),
            _ => messages.push("error_msg must be a string".to_string()),
        }
    }

    if let Some(value) = fields.get("row_number") {
        match value.as_i64() {
            Some(n) if n > 0 => patch.row_number = Some(n),
            _ => messages.push("row_number must be a positive integer".to_string()),
        }
    }

    if let Some(value) = fields.get("ingestion_id") {
        match value.as_i64() {
            Some(id) if id > 0 => patch.ingestion_id = Some(id),
            _ => messages.push("ingestion_id must be a positive integer".to_string()),
        }
    }

    if let Some(value) = fields.get("raw_data") {
        match value {
            Value::Object(map) => patch.raw_data = Some(map.clone()),
            _ => messages.push("raw_data must be a JSON object".to_string()),
        }
    }

    if messages.is_empty() {
        Ok(patch)
    } else {
        Err(RowValidationError { messages })
    }
}
