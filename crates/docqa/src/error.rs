//! Error types for the question-answering service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for docqa operations
pub type Result<T> = std::result::Result<T, Error>;

/// docqa errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials, invalid chunk parameters or an incompatible index
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request (blank question, empty upload)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested ingestion path does not exist
    #[error("Path not found: {0}")]
    NotFound(String),

    /// No supported documents were found in the given sources
    #[error("No supported documents were found in the provided sources")]
    NoDocuments,

    /// Documents were loaded but chunking produced nothing
    #[error("No fragments could be generated from the provided documents")]
    NoFragments,

    /// Query against a missing or unreadable index
    #[error("Vector index unavailable at '{location}': {message}")]
    IndexUnavailable { location: String, message: String },

    /// Embedding or LLM provider failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        provider: String,
        message: String,
        /// Timeouts, rate limits and 5xx responses
        retryable: bool,
    },

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// Create a provider error that a later attempt may not hit
    pub fn provider_transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            retryable: true,
        }
    }

    /// Create an index-unavailable error
    pub fn index_unavailable(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexUnavailable {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            Error::Provider { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorDb(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Task join error: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            Error::NotFound(path) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Path not found: {}", path),
            ),
            Error::NoDocuments => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_documents",
                self.to_string(),
            ),
            Error::NoFragments => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_fragments",
                self.to_string(),
            ),
            Error::IndexUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "index_unavailable",
                self.to_string(),
            ),
            Error::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error", self.to_string()),
            Error::FileParse { filename, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "parse_error",
                format!("Failed to parse '{}': {}", filename, message),
            ),
            Error::VectorDb(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
