//! Feature slices
//!
//! Each feature owns its commands, queries, and routes. Shared state is
//! injected through [`FeatureState`]: store contracts as trait objects plus
//! the operation counters, so every slice is testable against the in-memory
//! backend and the counters never live in module-level globals.

pub mod ingestion_errors;
pub mod ingestions;
pub mod inventory;
pub mod shared;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::metrics::Metrics;
use crate::store::{
    IngestionErrorStore, IngestionStore, InventoryStore, MemoryStore, PostgresStore,
};

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct FeatureState {
    pub inventory: Arc<dyn InventoryStore>,
    pub ingestions: Arc<dyn IngestionStore>,
    pub ingestion_errors: Arc<dyn IngestionErrorStore>,
    pub metrics: Arc<Metrics>,
    pub pool: Option<PgPool>,
}

impl FeatureState {
    /// Production wiring: all three contracts backed by Postgres.
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PostgresStore::new(pool.clone()));
        Self {
            inventory: store.clone(),
            ingestions: store.clone(),
            ingestion_errors: store,
            metrics: Arc::new(Metrics::new()),
            pool: Some(pool),
        }
    }

    /// In-process wiring for tests and database-free local runs.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            inventory: store.clone(),
            ingestions: store.clone(),
            ingestion_errors: store,
            metrics: Arc::new(Metrics::new()),
            pool: None,
        }
    }
}

/// The complete application router: feature slices under `/api` plus the
/// health and stats endpoints.
pub fn app_router(state: FeatureState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .nest("/api/inventory", inventory::routes::inventory_routes())
        .nest(
            "/api/ingestions",
            ingestions::routes::ingestions_routes()
                .merge(ingestion_errors::routes::ingestion_errors_routes()),
        )
        .with_state(state)
}

#[tracing::instrument(skip_all)]
async fn health(State(state): State<FeatureState>) -> Response {
    match &state.pool {
        Some(pool) => match crate::db::health_check(pool).await {
            Ok(()) => (
                StatusCode::OK,
                Json(ApiResponse::success(json!({ "database": "up" }))),
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Health check failed: {e}");
                let error = ErrorResponse::new("UNHEALTHY", "Database is unreachable");
                (StatusCode::SERVICE_UNAVAILABLE, Json(error)).into_response()
            }
        },
        None => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({ "database": "in-memory" }))),
        )
            .into_response(),
    }
}

#[tracing::instrument(skip_all)]
async fn stats(State(state): State<FeatureState>) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::success(state.metrics.snapshot())),
    )
        .into_response()
}
