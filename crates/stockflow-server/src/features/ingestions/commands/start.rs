//! Ingestion orchestrator
//!
//! Drives one uploaded batch through its full lifecycle: create the tracking
//! record, validate every row at its 1-based position, bulk-upsert the valid
//! rows, quarantine the invalid ones, and finalize the record's status.
//!
//! The steps are not wrapped in a single transaction; a store failure midway
//! leaves the ingestion record in `processing` and propagates the error.

use serde::Serialize;

use stockflow_common::types::{IngestionStatus, NewIngestionError, RawRow};

use crate::features::shared::validation::validate_row;
use crate::store::{IngestionErrorStore, IngestionStore, InventoryStore, StoreError};

#[derive(Debug, Clone)]
pub struct StartIngestionCommand {
    pub rows: Vec<RawRow>,
}

/// Outcome of one batch, returned to the uploader.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionSummary {
    pub ingestion_id: i64,
    pub total: i64,
    pub success: i64,
    pub errors: Vec<NewIngestionError>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartIngestionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip_all, fields(rows = command.rows.len()))]
pub async fn handle(
    ingestions: &dyn IngestionStore,
    inventory: &dyn InventoryStore,
    error_store: &dyn IngestionErrorStore,
    command: StartIngestionCommand,
) -> Result<IngestionSummary, StartIngestionError> {
    let total = command.rows.len() as i64;
    let ingestion = ingestions.create(total).await?;

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for (idx, raw) in command.rows.iter().enumerate() {
        let row_number = idx as i64 + 1;
        match validate_row(raw, ingestion.id) {
            Ok(row) => valid.push(row),
            Err(err) => invalid.push(NewIngestionError {
                ingestion_id: ingestion.id,
                row_number,
                error_msg: err.to_string(),
                raw_data: raw.clone(),
            }),
        }
    }

    if !valid.is_empty() {
        inventory.bulk_upsert(&valid).await?;
    }
    if !invalid.is_empty() {
        error_store.bulk_insert(&invalid).await?;
    }

    let status = if invalid.is_empty() {
        IngestionStatus::Complete
    } else {
        IngestionStatus::Error
    };
    let error_count = invalid.len() as i64;
    ingestions
        .update_status(ingestion.id, status, Some(error_count))
        .await?;

    tracing::info!(
        ingestion_id = ingestion.id,
        total,
        success = valid.len(),
        errors = invalid.len(),
        status = %status,
        "Ingestion finished"
    );

    Ok(IngestionSummary {
        ingestion_id: ingestion.id,
        total,
        success: valid.len() as i64,
        errors: invalid,
    })
}
