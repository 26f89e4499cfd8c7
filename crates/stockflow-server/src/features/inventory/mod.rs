//! Inventory CRUD feature

pub mod commands;
pub mod queries;
pub mod routes;
