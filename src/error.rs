//! Error types for the storage server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorResponse;

// == API Error Enum ==
/// Unified error type for the storage server.
///
/// The caches never produce one of these; a cache miss is a normal outcome.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request or form data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong API key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upload exceeds the configured size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Upload media type is not on the allow list
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Metadata store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Database(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg) => {
                warn!("API error: {} - {}", status.as_u16(), msg);
                msg
            }
            // Server-side details stay in the log
            other => {
                error!("Request failed: {}", other);
                "Internal Server Error".to_string()
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storage server.
pub type Result<T> = std::result::Result<T, ApiError>;
