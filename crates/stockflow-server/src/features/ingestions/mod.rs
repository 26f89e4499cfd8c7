//! Ingestion batch feature
//!
//! Owns the validate-and-partition pipeline and the ingestion record queries.

pub mod commands;
pub mod queries;
pub mod routes;
