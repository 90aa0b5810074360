//! Error types for fake-llm-endpoint
//!
//! All errors implement `IntoResponse` for Axum handlers. Error bodies are
//! short plain-text messages, mirroring what simple HTTP backends return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Expected Content-Type application/json")]
    UnsupportedContentType,

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Failed to read request body")]
    BodyRead(String),

    #[error("Invalid JSON body")]
    InvalidJson(String),

    #[error("Streaming not supported")]
    StreamingUnsupported,

    #[error("Failed to encode response")]
    ResponseEncoding(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedContentType
            | Self::BodyTooLarge { .. }
            | Self::BodyRead(_)
            | Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::StreamingUnsupported
            | Self::ResponseEncoding(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Details (serde messages, io errors) stay in the logs, not the body
        match &self {
            Self::BodyRead(detail) | Self::InvalidJson(detail) => {
                tracing::debug!(status = %status, detail = %detail, "Rejecting request");
            }
            Self::ResponseEncoding(detail) | Self::Internal(detail) => {
                tracing::error!(status = %status, detail = %detail, "Request failed");
            }
            _ => {}
        }

        (status, self.to_string()).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
