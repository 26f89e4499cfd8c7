//! Domain types for the inventory ingestion pipeline
//!
//! These are the shared shapes that flow between the stores, the ingestion
//! orchestrator, and the HTTP layer. Raw uploaded rows are deliberately kept
//! as loosely-typed JSON objects ([`RawRow`]) until they pass validation;
//! only validated data is represented with the strongly-typed
//! [`NewInventoryRow`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StockflowError;

/// An unvalidated input row as submitted by a client.
///
/// String keys mapping to arbitrary JSON values (string | number | boolean |
/// null | ...). Nothing in a `RawRow` may reach a store without passing the
/// row validator first.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state of an ingestion batch.
///
/// Created as `Processing`, finalized exactly once to `Complete` (no invalid
/// rows) or `Error` (one or more invalid rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Processing,
    Error,
    Complete,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Processing => "processing",
            IngestionStatus::Error => "error",
            IngestionStatus::Complete => "complete",
        }
    }
}

impl std::str::FromStr for IngestionStatus {
    type Err = StockflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(IngestionStatus::Processing),
            "error" => Ok(IngestionStatus::Error),
            "complete" => Ok(IngestionStatus::Complete),
            other => Err(StockflowError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One batch submission, tracked with aggregate status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingestion {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub status: IngestionStatus,
    pub total_rows: Option<i64>,
    pub error_count: Option<i64>,
}

/// One stock record, uniquely identified by `(sku, store)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub id: i64,
    pub sku: String,
    pub description: Option<String>,
    pub store: String,
    pub quantity: i64,
    pub last_upload: DateTime<Utc>,
    pub ingestion_id: i64,
}

/// A validated inventory row that has not been persisted yet.
///
/// Produced by the row validator; this is the only path from a [`RawRow`]
/// into the inventory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryRow {
    pub sku: String,
    pub description: Option<String>,
    pub store: String,
    pub quantity: i64,
    pub last_upload: DateTime<Utc>,
    pub ingestion_id: i64,
}

/// A quarantined row that failed validation during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionErrorRow {
    pub id: i64,
    pub ingestion_id: i64,
    pub row_number: i64,
    pub error_msg: String,
    pub raw_data: RawRow,
}

/// Input shape for quarantining a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngestionError {
    pub ingestion_id: i64,
    pub row_number: i64,
    pub error_msg: String,
    pub raw_data: RawRow,
}
