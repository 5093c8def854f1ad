//! Error types for queue-core operations.

use std::path::PathBuf;

/// All errors that can occur in queue-core operations.
///
/// `NotFound` is not exceptional: hook-driven callers treat it as "nothing to do".
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    // ─────────────────────────────────────────────────────────────────────
    // Record Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No queue entry for session: {session_id}")]
    NotFound { session_id: String },

    #[error("Malformed session file: {path}: {details}")]
    MalformedRecord { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock session file: {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encoding error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl QueueError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueueError::NotFound { .. })
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        QueueError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using QueueError.
pub type Result<T> = std::result::Result<T, QueueError>;

impl From<QueueError> for String {
    fn from(err: QueueError) -> String {
        err.to_string()
    }
}
