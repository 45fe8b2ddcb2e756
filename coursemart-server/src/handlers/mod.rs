//! Request handlers, grouped by resource.

pub mod events;
pub mod health;
pub mod resource;
pub mod shops;

use axum::http::Method;

use crate::error::ApiError;

/// Fallback for a known path hit with a verb it does not serve.
pub async fn method_not_allowed(method: Method) -> ApiError {
    tracing::debug!(%method, "[http.route] method not allowed");
    ApiError::MethodNotAllowed
}

/// Fallback for paths no route matches.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
