//! Ingestion API routes
//!
//! - `GET /api/ingestions` - List ingestion records
//! - `GET /api/ingestions/:id` - Get one ingestion record
//! - `POST /api/ingestions` - Run a batch through the ingestion pipeline

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use stockflow_common::types::RawRow;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;

use super::commands::{StartIngestionCommand, StartIngestionError};
use super::queries::{GetIngestionError, GetIngestionQuery, ListIngestionsError, ListIngestionsQuery};

pub fn ingestions_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_ingestions).post(start_ingestion))
        .route("/:id", get(get_ingestion))
}

#[tracing::instrument(skip_all)]
async fn list_ingestions(
    State(state): State<FeatureState>,
) -> Result<Response, IngestionApiError> {
    state.metrics.ingestion_list.incr();
    let rows =
        super::queries::list::handle(state.ingestions.as_ref(), ListIngestionsQuery).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))).into_response())
}

#[tracing::instrument(skip_all)]
async fn get_ingestion(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
) -> Result<Response, IngestionApiError> {
    state.metrics.ingestion_get.incr();
    if id <= 0 {
        return Err(IngestionApiError::InvalidId(id));
    }
    let ingestion =
        super::queries::get::handle(state.ingestions.as_ref(), GetIngestionQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(ingestion))).into_response())
}

/// The body must be a non-empty JSON array of objects; anything else is
/// rejected here, before the pipeline creates any record.
#[tracing::instrument(skip_all)]
async fn start_ingestion(
    State(state): State<FeatureState>,
    Json(body): Json<Value>,
) -> Result<Response, IngestionApiError> {
    state.metrics.ingestion_start.incr();

    let Value::Array(items) = body else {
        return Err(IngestionApiError::BadBody(
            "Request body must be a JSON array of rows",
        ));
    };
    if items.is_empty() {
        return Err(IngestionApiError::BadBody(
            "Request body must contain at least one row",
        ));
    }
    let mut rows: Vec<RawRow> = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(map) => rows.push(map),
            _ => {
                return Err(IngestionApiError::BadBody(
                    "Every row must be a JSON object",
                ))
            }
        }
    }

    let summary = super::commands::start::handle(
        state.ingestions.as_ref(),
        state.inventory.as_ref(),
        state.ingestion_errors.as_ref(),
        StartIngestionCommand { rows },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(summary))).into_response())
}

/// Unified error type for ingestion API endpoints
#[derive(Debug)]
enum IngestionApiError {
    InvalidId(i64),
    BadBody(&'static str),
    Start(StartIngestionError),
    Get(GetIngestionError),
    List(ListIngestionsError),
}

impl From<StartIngestionError> for IngestionApiError {
    fn from(err: StartIngestionError) -> Self {
        Self::Start(err)
    }
}

impl From<GetIngestionError> for IngestionApiError {
    fn from(err: GetIngestionError) -> Self {
        Self::Get(err)
    }
}

impl From<ListIngestionsError> for IngestionApiError {
    fn from(err: ListIngestionsError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for IngestionApiError {
    fn into_response(self) -> Response {
        match self {
            IngestionApiError::InvalidId(id) => {
                let error =
                    ErrorResponse::new("INVALID_ID", format!("'{id}' is not a valid ingestion id"));
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            IngestionApiError::BadBody(message) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", message);
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            IngestionApiError::Get(err @ GetIngestionError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            IngestionApiError::Start(StartIngestionError::Store(e))
            | IngestionApiError::Get(GetIngestionError::Store(e))
            | IngestionApiError::List(ListIngestionsError::Store(e)) => {
                tracing::error!("Store error in ingestion API: {e}");
                let error = ErrorResponse::new("INTERNAL_ERROR", "A storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_structure() {
        let router = ingestions_routes();
        assert!(format!("{router:?}").contains("Router"));
    }
}
