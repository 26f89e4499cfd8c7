//! Error types for Stockflow

use thiserror::Error;

/// Result type alias for Stockflow operations
pub type Result<T> = std::result::Result<T, StockflowError>;

/// Main error type for Stockflow
#[derive(Error, Debug)]
pub enum StockflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid ingestion status: {0}")]
    InvalidStatus(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
