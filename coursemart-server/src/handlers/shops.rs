//! Course creation from a JSON body.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use coursemart::{NewShop, Record, Shop};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/shops`
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewShop>, JsonRejection>,
) -> Result<(StatusCode, Json<Record<Shop>>), ApiError> {
    let Json(draft) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let record = state.contract::<Shop>().create(draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
