//! Error types for procwatch.
//!
//! Snapshot failures are the only errors expected at runtime; they are logged by
//! the session that hit them and never reach a connected client.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the procwatch core.
#[derive(Debug, Error)]
pub enum ProcwatchError {
    // Snapshot errors
    #[error("Process snapshot failed: {message}")]
    SnapshotFetch { message: String },

    #[error("Process snapshot timed out after {0:?}")]
    SnapshotTimeout(Duration),

    // Delivery errors
    #[error("Notification channel closed")]
    ChannelClosed,

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for procwatch operations.
pub type Result<T> = std::result::Result<T, ProcwatchError>;

impl From<serde_json::Error> for ProcwatchError {
    fn from(err: serde_json::Error) -> Self {
        ProcwatchError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<tokio::task::JoinError> for ProcwatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProcwatchError::SnapshotFetch {
            message: format!("Enumeration task failed: {}", err),
        }
    }
}

impl ProcwatchError {
    /// Create a snapshot failure from any displayable cause.
    pub fn snapshot(message: impl Into<String>) -> Self {
        ProcwatchError::SnapshotFetch {
            message: message.into(),
        }
    }

    /// Whether this error came from enumerating the process table.
    ///
    /// These are retried implicitly by the next scheduler tick.
    pub fn is_snapshot_failure(&self) -> bool {
        matches!(
            self,
            ProcwatchError::SnapshotFetch { .. } | ProcwatchError::SnapshotTimeout(_)
        )
    }
}
