//! Error types for computectl
//!
//! This module defines the error handling strategy for computectl. There are
//! two error types: `ComputectlError` (main error enum) and `ConfigError`
//! (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `ComputectlError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling. The
//! conversion happens at the CLI boundary using `anyhow::Error::from` to
//! preserve error chains.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable` to indicate whether an operation should be
//! retried. The `RetryPolicy` in `src/retry.rs` uses this to decide whether
//! a failed backend call is worth repeating. Only `Api` errors flagged as
//! transient (5xx, connection failures) and `Io` are retryable.
//!
//! Non-retryable errors (`Validation`, `UnusedResources`, `Config`) fail
//! immediately: invalid input will not become valid on a second attempt.

use thiserror::Error;

/// Main error type for computectl
#[derive(Error, Debug)]
pub enum ComputectlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// The one user-visible allocation error: capacity left unassigned at
    /// submission time.
    #[error("You now have {summary} unused. Allocate it to any of the services before saving.")]
    UnusedResources {
        summary: String,
        unallocated_vcpu: i64,
        unallocated_memory: i64,
    },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ComputectlError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to determine whether an error
/// should trigger a retry attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for ComputectlError {
    fn is_retryable(&self) -> bool {
        match self {
            ComputectlError::Api { retryable, .. } => *retryable,
            ComputectlError::Network(_)
            | ComputectlError::Retryable { .. }
            | ComputectlError::Io(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ComputectlError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ComputectlError::Api {
                status: status.as_u16(),
                message: err.to_string(),
                retryable: status.is_server_error(),
            }
        } else {
            ComputectlError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_not_retryable() {
        let err = ComputectlError::Validation {
            field: "vcpu".to_string(),
            reason: "out of range".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_error_retryable() {
        let err = ComputectlError::Api {
            status: 503,
            message: "service unavailable".to_string(),
            retryable: true,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_error_not_retryable() {
        let err = ComputectlError::Api {
            status: 400,
            message: "bad request".to_string(),
            retryable: false,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unused_resources_message() {
        let err = ComputectlError::UnusedResources {
            summary: "0.25 vCPUs and 512 MiB of Memory".to_string(),
            unallocated_vcpu: 250,
            unallocated_memory: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("unused"));
        assert!(msg.contains("Allocate it to any of the services"));
    }
}
