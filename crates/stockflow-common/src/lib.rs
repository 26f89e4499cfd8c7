//! Stockflow Common Library
//!
//! Shared types, error handling, and logging bootstrap for the Stockflow
//! workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across workspace members:
//!
//! - **Types**: The inventory/ingestion domain model
//! - **Error Handling**: The shared error type
//! - **Logging**: Centralized tracing configuration

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, StockflowError};
