//! Domain-specific error types for glass-mind

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::clients::ModelError;

/// Body returned for any failure the caller cannot fix
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process request";

/// Main error type for the glass-mind service
#[derive(Error, Debug)]
pub enum GlassMindError {
    /// Caller input problem; `message` is returned to the caller verbatim
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GlassMindError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GlassMindError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for GlassMindError {
    fn from(err: anyhow::Error) -> Self {
        GlassMindError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GlassMindError {
    fn from(err: serde_json::Error) -> Self {
        GlassMindError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Convert GlassMindError to an HTTP response without leaking internal detail
impl IntoResponse for GlassMindError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            GlassMindError::Validation { message } => {
                tracing::warn!("Rejected request: {}", message);
                message
            }
            other => {
                tracing::error!("Request failed: {}", other);
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for glass-mind operations
pub type Result<T> = std::result::Result<T, GlassMindError>;
