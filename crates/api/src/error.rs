//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orchestrator::OrderingError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client, rejected before reaching the orchestrator.
    #[error("{0}")]
    BadRequest(String),

    /// Order placement or retrieval failed.
    #[error(transparent)]
    Ordering(#[from] OrderingError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ordering(err) => match err {
                OrderingError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
                OrderingError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
                OrderingError::EmptyOrder => StatusCode::UNPROCESSABLE_ENTITY,
                OrderingError::ProductsUnavailable(_) => StatusCode::BAD_GATEWAY,
                OrderingError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                OrderingError::OrderLookupFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderingError::OrderPersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Ordering(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        }

        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
