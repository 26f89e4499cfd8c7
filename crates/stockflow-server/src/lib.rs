//! Stockflow Server Library
//!
//! HTTP service for CSV-driven inventory ingestion.
//!
//! # Overview
//!
//! The server accepts batches of loosely-typed inventory rows, validates each
//! row, upserts valid rows into the inventory table keyed by `(sku, store)`,
//! and quarantines invalid rows as correctable ingestion errors. A CRUD API
//! covers inventory rows, ingestion batches, and quarantined rows, including
//! a correction workflow that can promote a fixed row back into inventory.
//!
//! # Architecture
//!
//! Feature slices under [`features`] follow a command/query split: each write
//! operation lives in its own `commands/*.rs` file with a typed command, a
//! typed error enum, and a `handle` function; reads live under `queries/`.
//! Persistence is reached only through the store contracts in [`store`],
//! which have a Postgres implementation for production and an in-memory
//! implementation with identical semantics for tests.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extraction
//! - **SQLx**: Postgres pool, queries, and migrations
//! - **Tower / tower-http**: tracing and CORS middleware

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod metrics;
pub mod middleware;
pub mod store;
