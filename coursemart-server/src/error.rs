//! The error type every handler returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coursemart::{ResourceError, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Every way a request can fail, rendered as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A resource contract operation failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// No bearer token on an admin route.
    #[error("Not authorized, no token")]
    MissingToken,

    /// A bearer token that is not configured.
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// Malformed body or form.
    #[error("{0}")]
    BadRequest(String),

    /// Body over the configured upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Route exists, method does not.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// No route matches the path.
    #[error("Not found")]
    RouteNotFound,

    /// Writing an uploaded image failed.
    #[error("Failed to store upload: {0}")]
    Upload(#[source] std::io::Error),

    /// The health check could not reach the store.
    #[error("Document store unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

impl ApiError {
    /// HTTP status for this failure.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Resource(error) => match error {
                ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ResourceError::InvalidId { .. } | ResourceError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                ResourceError::Unsupported { .. } => StatusCode::METHOD_NOT_ALLOWED,
                ResourceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "[http.error] request failed");
        } else {
            debug!(status = status.as_u16(), error = %message, "[http.error] request rejected");
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use coursemart::{ResourceOperation, StoreOperation, ValidationError};

    use super::*;

    #[test]
    fn resource_errors_map_onto_statuses() {
        let cases = [
            (ResourceError::NotFound { label: "Course" }, StatusCode::NOT_FOUND),
            (
                ResourceError::InvalidId {
                    raw: "abc".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ResourceError::Validation(ValidationError::required("name")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ResourceError::Unsupported {
                    label: "Course",
                    operation: ResourceOperation::Update,
                },
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (
                ResourceError::Store(StoreError::StoreFailure {
                    operation: StoreOperation::FindAll,
                    detail: "down".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn auth_messages_match_client_expectations() {
        assert_eq!(ApiError::MissingToken.to_string(), "Not authorized, no token");
        assert_eq!(ApiError::InvalidToken.to_string(), "Not authorized, token failed");
        assert_eq!(ApiError::MissingToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn resource_messages_pass_through_unchanged() {
        let error = ApiError::from(ResourceError::NotFound { label: "Event" });

        assert_eq!(error.to_string(), "Event not found");
    }
}
