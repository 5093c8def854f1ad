//! Hook event input.
//!
//! Agent hooks pipe one JSON object on stdin. Only a few fields are common to
//! every event; the rest are kept raw so event-specific details can be pulled
//! out without modelling each event.

use std::io::Read;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{QueueError, Result};

/// Raw keys checked, in order, for the most specific event kind.
const EVENT_KIND_KEYS: [&str; 3] = ["notification_type", "type", "matcher"];

/// Common fields from hook JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HookInput {
    pub session_id: String,
    pub cwd: String,
    pub hook_event_name: String,
    /// Full parsed object for event-specific fields.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl HookInput {
    /// Reads and parses hook JSON from `reader`.
    pub fn parse<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| QueueError::io("reading hook input", e))?;
        Self::from_slice(&data)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let raw: Map<String, Value> =
            serde_json::from_slice(data).map_err(|source| QueueError::Json {
                context: "parsing hook input".to_string(),
                source,
            })?;
        let mut input =
            HookInput::deserialize(Value::Object(raw.clone())).map_err(|source| {
                QueueError::Json {
                    context: "parsing hook input".to_string(),
                    source,
                }
            })?;
        input.raw = raw;
        Ok(input)
    }

    /// The most specific event kind available.
    ///
    /// Prefers `notification_type`, then `type`, then `matcher`, falling back
    /// to `hook_event_name`.
    pub fn event_type(&self) -> &str {
        EVENT_KIND_KEYS
            .iter()
            .find_map(|key| self.raw_str(key).filter(|v| !v.is_empty()))
            .unwrap_or(self.hook_event_name.as_str())
    }

    /// The `message` field, or empty if absent.
    pub fn message(&self) -> &str {
        self.raw_str("message").unwrap_or_default()
    }

    fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }
}
