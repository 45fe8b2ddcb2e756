//! Handlers shared by every resource type.

use axum::extract::{Path, State};
use axum::Json;
use coursemart::{Record, Resource};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET` on a collection.
pub async fn list<R: Resource>(
    State(state): State<AppState>,
) -> Result<Json<Vec<Record<R>>>, ApiError> {
    Ok(Json(state.contract::<R>().list().await?))
}

/// `GET` on one entity.
pub async fn show<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record<R>>, ApiError> {
    Ok(Json(state.contract::<R>().get(&id).await?))
}

/// `DELETE` on one entity.
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.contract::<R>().delete(&id).await?;
    Ok(deleted::<R>())
}

/// Confirmation body for a successful delete.
pub fn deleted<R: Resource>() -> Json<Value> {
    Json(json!({ "message": format!("{} deleted successfully", R::LABEL) }))
}
