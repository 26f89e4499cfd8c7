//! Quarantined-row feature
//!
//! Rows that fail ingestion validation land here for inspection, correction,
//! and promotion back into the inventory table.

pub mod commands;
pub mod queries;
pub mod routes;
