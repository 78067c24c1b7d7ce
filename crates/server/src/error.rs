//! HTTP errors for the nrfeed server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nrfeed_core::Error;

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unknown feed identifier.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// No document could be produced for the feed.
    #[error("UPSTREAM_UNAVAILABLE: {0}")]
    Unavailable(String),

    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::UpstreamUnavailable(msg) => ApiError::Unavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound(msg) | ApiError::Unavailable(msg) => msg.clone(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                "internal server error".to_string()
            }
        };
        (status, message).into_response()
    }
}
