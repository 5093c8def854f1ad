//! JSON encoding for session files.
//!
//! Two shapes are accepted on read:
//!
//! ```json
//! { "current": { ...record... }, "history": [ ... ] }
//! ```
//!
//! and the legacy bare record written by older builds:
//!
//! ```json
//! { "timestamp": "...", "session_id": "abc", ... }
//! ```
//!
//! The legacy shape decodes as a file with empty history. Writes always use the
//! wrapped shape, so the next store write upgrades a legacy file in place.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{QueueError, Result};
use crate::types::{SessionFile, SessionRecord};

/// Why a byte buffer could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No content (or only whitespace). Means "no prior record".
    #[error("empty session file")]
    Empty,

    #[error("{0}")]
    Malformed(String),
}

/// Decodes a session file in either the wrapped or the legacy bare shape.
pub fn decode(bytes: &[u8]) -> std::result::Result<SessionFile, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if value.get("current").is_some_and(|c| !c.is_null()) {
        return SessionFile::deserialize(value).map_err(|e| DecodeError::Malformed(e.to_string()));
    }

    let record =
        SessionRecord::deserialize(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if record.session_id.is_empty() {
        return Err(DecodeError::Malformed(
            "neither a wrapped session file nor a bare record with session_id".to_string(),
        ));
    }
    Ok(SessionFile::new(record))
}

/// Encodes a session file as indented JSON.
pub fn encode(file: &SessionFile) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(file).map_err(|source| QueueError::Json {
        context: format!("encoding session {}", file.current.session_id),
        source,
    })
}
