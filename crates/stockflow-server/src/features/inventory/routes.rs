//! Inventory API routes
//!
//! - `GET /api/inventory` - List all inventory rows
//! - `POST /api/inventory` - Create a row (full validation, natural-key conflict check)
//! - `PUT /api/inventory/:id` - Partial update (sku and store are immutable)
//! - `DELETE /api/inventory/:id` - Remove a row

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use stockflow_common::types::RawRow;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;

use super::commands::{
    CreateInventoryCommand, CreateInventoryError, DeleteInventoryCommand, DeleteInventoryError,
    UpdateInventoryCommand, UpdateInventoryError,
};
use super::queries::{ListInventoryError, ListInventoryQuery};

pub fn inventory_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory))
        .route("/:id", put(update_inventory).delete(delete_inventory))
}

#[tracing::instrument(skip_all)]
async fn list_inventory(State(state): State<FeatureState>) -> Result<Response, InventoryApiError> {
    state.metrics.inventory_list.incr();
    let rows = super::queries::list::handle(state.inventory.as_ref(), ListInventoryQuery).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))).into_response())
}

#[tracing::instrument(skip_all)]
async fn create_inventory(
    State(state): State<FeatureState>,
    Json(row): Json<RawRow>,
) -> Result<Response, InventoryApiError> {
    state.metrics.inventory_create.incr();
    let created =
        super::commands::create::handle(state.inventory.as_ref(), CreateInventoryCommand { row })
            .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))).into_response())
}

#[tracing::instrument(skip_all)]
async fn update_inventory(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
    Json(fields): Json<RawRow>,
) -> Result<Response, InventoryApiError> {
    state.metrics.inventory_update.incr();
    check_id(id)?;
    let updated = super::commands::update::handle(
        state.inventory.as_ref(),
        UpdateInventoryCommand { id, fields },
    )
    .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(updated))).into_response())
}

#[tracing::instrument(skip_all)]
async fn delete_inventory(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
) -> Result<Response, InventoryApiError> {
    state.metrics.inventory_delete.incr();
    check_id(id)?;
    super::commands::delete::handle(state.inventory.as_ref(), DeleteInventoryCommand { id })
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn check_id(id: i64) -> Result<(), InventoryApiError> {
    if id <= 0 {
        return Err(InventoryApiError::InvalidId(id));
    }
    Ok(())
}

/// Unified error type for inventory API endpoints
#[derive(Debug)]
enum InventoryApiError {
    InvalidId(i64),
    Create(CreateInventoryError),
    Update(UpdateInventoryError),
    Delete(DeleteInventoryError),
    List(ListInventoryError),
}

impl From<CreateInventoryError> for InventoryApiError {
    fn from(err: CreateInventoryError) -> Self {
        Self::Create(err)
    }
}

impl From<UpdateInventoryError> for InventoryApiError {
    fn from(err: UpdateInventoryError) -> Self {
        Self::Update(err)
    }
}

impl From<DeleteInventoryError> for InventoryApiError {
    fn from(err: DeleteInventoryError) -> Self {
        Self::Delete(err)
    }
}

impl From<ListInventoryError> for InventoryApiError {
    fn from(err: ListInventoryError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for InventoryApiError {
    fn into_response(self) -> Response {
        match self {
            InventoryApiError::InvalidId(id) => {
                let error =
                    ErrorResponse::new("INVALID_ID", format!("'{id}' is not a valid row id"));
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            InventoryApiError::Create(CreateInventoryError::Validation(e)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", e.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            InventoryApiError::Create(err @ CreateInventoryError::Conflict { .. }) => {
                let error = ErrorResponse::new("CONFLICT", err.to_string());
                (StatusCode::CONFLICT, Json(error)).into_response()
            }
            InventoryApiError::Update(UpdateInventoryError::Validation(e)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", e.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            InventoryApiError::Update(err @ UpdateInventoryError::ImmutableField(_)) => {
                let error = ErrorResponse::new("IMMUTABLE_FIELD", err.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            InventoryApiError::Update(err @ UpdateInventoryError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            InventoryApiError::Delete(err @ DeleteInventoryError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            InventoryApiError::Create(CreateInventoryError::Store(e))
            | InventoryApiError::Update(UpdateInventoryError::Store(e))
            | InventoryApiError::Delete(DeleteInventoryError::Store(e))
            | InventoryApiError::List(ListInventoryError::Store(e)) => {
                tracing::error!("Store error in inventory API: {e}");
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
        let router = inventory_routes();
        assert!(format!("{router:?}").contains("Router"));
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        assert!(check_id(0).is_err());
        assert!(check_id(-5).is_err());
        assert!(check_id(1).is_ok());
    }
}
