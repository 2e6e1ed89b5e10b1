//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use messagebus::HandlerError;
use product_store::StoreError;

/// Failure surface of the HTTP handlers.
///
/// Every variant renders as a status code plus a JSON body of the form
/// `{"message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// The addressed resource does not exist.
    NotFound(String),
    /// The request itself is malformed.
    BadRequest(String),
    /// Message handling failed.
    Handler(HandlerError),
    /// Anything the client cannot act on.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Handler(err) => handler_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed internally");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn handler_error_to_response(err: HandlerError) -> (StatusCode, String) {
    match &err {
        HandlerError::InvalidSku { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        HandlerError::UnknownBatch { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        HandlerError::Product(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        HandlerError::Store(
            StoreError::VersionConflict { .. } | StoreError::DuplicateProduct(_),
        ) => (StatusCode::CONFLICT, err.to_string()),
        _ => {
            tracing::error!(error = %err, "unexpected handler error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<HandlerError> for ApiError {
    fn from(err: HandlerError) -> Self {
        ApiError::Handler(err)
    }
}
