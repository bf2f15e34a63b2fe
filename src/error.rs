//! Error types for mediagen-tasks
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (task store, database, transfer)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for mediagen-tasks operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediagen-tasks
///
/// Errors local to one unit of work (one result URL, one remote poll) are
/// contained by the tracker and degrade the result instead of aborting it.
/// Only validation and structural errors reach the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "remote.base_url")
        key: Option<String>,
    },

    /// Malformed or missing caller input, rejected before any I/O
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// Task store error (missing or duplicate task)
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Remote generation API reported an error or returned an unusable payload
    #[error("remote API error: {0}")]
    Remote(String),

    /// Fetching a single result resource failed
    #[error("transfer of {url} failed: {reason}")]
    Transfer {
        /// Source URL that could not be materialized
        url: String,
        /// Why the transfer failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Task store errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// No record exists for the task id
    #[error("task {task_id} not found")]
    NotFound {
        /// The task id that was not found
        task_id: String,
    },

    /// A record already exists for the task id
    #[error("task {task_id} already exists")]
    AlreadyExists {
        /// The task id that was inserted twice
        task_id: String,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be decoded into a record
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

impl Error {
    /// Returns true when this error is a duplicate-creation conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Task(TaskError::AlreadyExists { .. }))
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task error: task abc123 not found",
///     "details": {
///       "task_id": "abc123"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            Error::Task(TaskError::NotFound { .. }) => 404,
            Error::Task(TaskError::AlreadyExists { .. }) => 409,

            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // Upstream generation API or result host misbehaved
            Error::Remote(_) => 502,
            Error::Network(_) => 502,
            Error::Transfer { .. } => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::AlreadyExists { .. } => "conflict",
            },
            Error::Database(_) => "database_error",
            Error::Remote(_) => "remote_error",
            Error::Transfer { .. } => "transfer_failed",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Task(TaskError::NotFound { task_id })
            | Error::Task(TaskError::AlreadyExists { task_id }) => Some(serde_json::json!({
                "task_id": task_id,
            })),
            Error::Transfer { url, .. } => Some(serde_json::json!({
                "url": url,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// (Error, expected_status_code, expected_error_code) for every match arm
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "empty".into(),
                    key: Some("remote.base_url".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::Validation("task_id is required".into()),
                400,
                "validation_error",
            ),
            (
                Error::Task(TaskError::NotFound {
                    task_id: "t1".into(),
                }),
                404,
                "task_not_found",
            ),
            (
                Error::Task(TaskError::AlreadyExists {
                    task_id: "t1".into(),
                }),
                409,
                "conflict",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("locked".into())),
                500,
                "database_error",
            ),
            (
                Error::Remote("code 500: busy".into()),
                502,
                "remote_error",
            ),
            (
                Error::Transfer {
                    url: "http://x/a.png".into(),
                    reason: "HTTP 404".into(),
                },
                502,
                "transfer_failed",
            ),
            (
                Error::Io(std::io::Error::other("disk full")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "{expected_code} returned the wrong status"
            );
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[test]
    fn only_already_exists_is_a_conflict() {
        for (error, _, code) in all_error_variants() {
            assert_eq!(error.is_conflict(), code == "conflict", "{code}");
        }
    }

    #[test]
    fn api_error_from_task_not_found_has_task_id() {
        let api_error: ApiError = Error::Task(TaskError::NotFound {
            task_id: "abc123".into(),
        })
        .into();

        assert_eq!(api_error.error.code, "task_not_found");
        assert!(api_error.error.message.contains("abc123"));
        assert_eq!(api_error.error.details.unwrap()["task_id"], "abc123");
    }

    #[test]
    fn api_error_from_validation_has_no_details() {
        let api_error: ApiError = Error::Validation("task_id is required".into()).into();

        assert_eq!(api_error.error.code, "validation_error");
        assert!(api_error.error.details.is_none());
    }
}
