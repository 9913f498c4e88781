//! Log events produced from tailed input.
//!
//! One [`Event`] is built per complete line and broadcast to every
//! connected client. Events are never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Name of the input the event came from (e.g. `"tail"`).
    pub source: String,
    /// When the line was recognized as complete.
    #[serde(rename = "at")]
    pub timestamp: DateTime<Utc>,
    /// The line text, without its trailing newline.
    pub message: String,
    /// Extra key/value annotations. Omitted on the wire when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl Event {
    /// Creates an event with no extra fields.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            timestamp,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds one annotation, replacing any previous value for `key`.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
