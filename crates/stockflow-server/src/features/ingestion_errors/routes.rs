//! Quarantined-row API routes, mounted under `/api/ingestions`
//!
//! - `GET /api/ingestions/:id/errors` - List error rows for one ingestion
//! - `PUT /api/ingestions/errors/:error_id` - Correct a quarantined row
//! - `DELETE /api/ingestions/errors/:error_id` - Discard a quarantined row
//! - `POST /api/ingestions/errors/:error_id/promote` - Promote into inventory

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use stockflow_common::types::RawRow;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;

use super::commands::{
    CorrectErrorCommand, CorrectErrorError, DeleteErrorCommand, DeleteErrorError,
    PromoteErrorCommand, PromoteErrorError,
};
use super::queries::{ListErrorsError, ListErrorsQuery};

pub fn ingestion_errors_routes() -> Router<FeatureState> {
    Router::new()
        .route("/:id/errors", get(list_errors))
        .route("/errors/:error_id", put(correct_error).delete(delete_error))
        .route("/errors/:error_id/promote", post(promote_error))
}

#[tracing::instrument(skip_all)]
async fn list_errors(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
) -> Result<Response, ErrorApiError> {
    state.metrics.error_list.incr();
    check_id(id)?;
    let rows = super::queries::list_by_ingestion::handle(
        state.ingestion_errors.as_ref(),
        ListErrorsQuery { ingestion_id: id },
    )
    .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))).into_response())
}

#[tracing::instrument(skip_all)]
async fn correct_error(
    State(state): State<FeatureState>,
    Path(error_id): Path<i64>,
    Json(fields): Json<RawRow>,
) -> Result<Response, ErrorApiError> {
    state.metrics.error_correct.incr();
    check_id(error_id)?;
    let updated = super::commands::correct::handle(
        state.ingestion_errors.as_ref(),
        CorrectErrorCommand {
            id: error_id,
            fields,
        },
    )
    .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(updated))).into_response())
}

#[tracing::instrument(skip_all)]
async fn delete_error(
    State(state): State<FeatureState>,
    Path(error_id): Path<i64>,
) -> Result<Response, ErrorApiError> {
    state.metrics.error_delete.incr();
    check_id(error_id)?;
    super::commands::delete::handle(
        state.ingestion_errors.as_ref(),
        DeleteErrorCommand { id: error_id },
    )
    .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[tracing::instrument(skip_all)]
async fn promote_error(
    State(state): State<FeatureState>,
    Path(error_id): Path<i64>,
) -> Result<Response, ErrorApiError> {
    state.metrics.error_promote.incr();
    check_id(error_id)?;
    let response = super::commands::promote::handle(
        state.inventory.as_ref(),
        state.ingestion_errors.as_ref(),
        PromoteErrorCommand { id: error_id },
    )
    .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

fn check_id(id: i64) -> Result<(), ErrorApiError> {
    if id <= 0 {
        return Err(ErrorApiError::InvalidId(id));
    }
    Ok(())
}

/// Unified error type for quarantined-row API endpoints
#[derive(Debug)]
enum ErrorApiError {
    InvalidId(i64),
    Correct(CorrectErrorError),
    Delete(DeleteErrorError),
    Promote(PromoteErrorError),
    List(ListErrorsError),
}

impl From<CorrectErrorError> for ErrorApiError {
    fn from(err: CorrectErrorError) -> Self {
        Self::Correct(err)
    }
}

impl From<DeleteErrorError> for ErrorApiError {
    fn from(err: DeleteErrorError) -> Self {
        Self::Delete(err)
    }
}

impl From<PromoteErrorError> for ErrorApiError {
    fn from(err: PromoteErrorError) -> Self {
        Self::Promote(err)
    }
}

impl From<ListErrorsError> for ErrorApiError {
    fn from(err: ListErrorsError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for ErrorApiError {
    fn into_response(self) -> Response {
        match self {
            ErrorApiError::InvalidId(id) => {
                let error =
                    ErrorResponse::new("INVALID_ID", format!("'{id}' is not a valid id"));
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            ErrorApiError::Correct(CorrectErrorError::Validation(e)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", e.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            ErrorApiError::Correct(err @ CorrectErrorError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            ErrorApiError::Delete(err @ DeleteErrorError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            ErrorApiError::Promote(err @ PromoteErrorError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            ErrorApiError::Promote(err @ PromoteErrorError::DataShape(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", err.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            ErrorApiError::Promote(PromoteErrorError::Validation(e)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", e.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            ErrorApiError::Promote(err @ PromoteErrorError::Incomplete { .. }) => {
                tracing::error!("Partial promotion: {err}");
                let error = ErrorResponse::new("PROMOTION_INCOMPLETE", err.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }
            ErrorApiError::Correct(CorrectErrorError::Store(e))
            | ErrorApiError::Delete(DeleteErrorError::Store(e))
            | ErrorApiError::Promote(PromoteErrorError::Store(e))
            | ErrorApiError::List(ListErrorsError::Store(e)) => {
                tracing::error!("Store error in ingestion errors API: {e}");
                let error = ErrorResponse::new("INTERNAL_ERROR", "A storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }
        }
    }
}
