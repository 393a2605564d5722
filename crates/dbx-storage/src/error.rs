//! Storage error types.

use dbx_models::PathError;
use thiserror::Error;

use crate::types::ApiErrorBody;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Dropbox API error ({status}): {summary}")]
    Api { status: u16, summary: String },

    #[error("Shared link unavailable: {0}")]
    SharedLinkUnavailable(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Storage adapter is not configured")]
    AdapterMissing,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn link_unavailable(path: impl Into<String>) -> Self {
        Self::SharedLinkUnavailable(path.into())
    }

    /// Classify a non-success Dropbox response.
    ///
    /// Dropbox reports endpoint errors as 409 with an `error_summary` such as
    /// `path/not_found/..`.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        let summary = serde_json::from_str::<ApiErrorBody>(body)
            .map(|e| e.error_summary)
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            401 => Self::Unauthorized(summary),
            429 => Self::RateLimited(summary),
            409 if summary.contains("not_found") => Self::NotFound(summary),
            _ => Self::Api { status, summary },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Network(_) | StorageError::RateLimited(_)
        ) || matches!(self, StorageError::Api { status, .. } if *status >= 500)
    }
}
