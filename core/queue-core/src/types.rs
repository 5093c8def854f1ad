//! Serialized state types for the session queue.
//!
//! One [`SessionFile`] per session lives on disk. Field names are the on-disk
//! JSON keys and must stay readable by older builds, which only knew the bare
//! record shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of prior records retained per session.
pub const MAX_HISTORY: usize = 10;

/// State snapshot for one session at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    /// Window displaying the session. Empty if unknown.
    #[serde(rename = "kitty_window_id")]
    pub window_id: String,
    /// Multiplexer socket owning `window_id`. Empty means the default instance.
    #[serde(rename = "kitty_listen_on", skip_serializing_if = "String::is_empty")]
    pub window_endpoint: String,
    pub pid: i64,
    pub cwd: String,
    /// What the session is waiting on or doing. Open-ended.
    #[serde(rename = "event")]
    pub event_kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl SessionRecord {
    /// Returns true if both records describe the same event and message.
    ///
    /// Repeats of the same pair are not pushed to history.
    pub fn same_event(&self, other: &SessionRecord) -> bool {
        self.event_kind == other.event_kind && self.message == other.message
    }
}

/// On-disk unit: the current record plus prior ones, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    pub current: SessionRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<SessionRecord>,
}

impl SessionFile {
    pub fn new(current: SessionRecord) -> Self {
        SessionFile {
            current,
            history: Vec::new(),
        }
    }

    /// Applies one write to an optional prior file.
    ///
    /// The outgoing `current` moves to the head of history unless it has the same
    /// `(event, message)` as `record`. History is truncated to [`MAX_HISTORY`].
    pub fn advance(prior: Option<SessionFile>, record: SessionRecord) -> SessionFile {
        let Some(SessionFile {
            current,
            mut history,
        }) = prior
        else {
            return SessionFile::new(record);
        };

        if !current.same_event(&record) {
            history.insert(0, current);
        }
        history.truncate(MAX_HISTORY);

        SessionFile {
            current: record,
            history,
        }
    }
}
