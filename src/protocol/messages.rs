//! Wire message types and the tag table.
//!
//! Outbound messages are grouped in [`ServerMessage`]; inbound payloads are
//! parsed per tag by the handler registered for it. Renaming a Rust type
//! never changes the wire: tags live in [`tags`] and only there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::Tagged;
use crate::domain::Event;

/// Version of the tag table below. Bump when a tag is added or changed.
pub const PROTOCOL_VERSION: u32 = 1;

/// Wire tags, one per message type.
pub mod tags {
    /// Server → client: one log line.
    pub const LINE_EVENT: &str = "LineEvent";
    /// Server → client: the tailed input failed.
    pub const TAIL_ERROR: &str = "TailError";
    /// Server → client: reply to [`PING`].
    pub const PONG: &str = "Pong";
    /// Client → server: liveness probe answered with [`PONG`].
    pub const PING: &str = "Ping";
    /// Client → server: keep-alive, ignored.
    pub const HEARTBEAT: &str = "Heartbeat";
}

/// Notice broadcast when the tailed input fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailNotice {
    /// Name of the failing input.
    pub source: String,
    /// When the failure was observed.
    pub at: DateTime<Utc>,
    /// Human-readable error text.
    pub message: String,
}

/// Reply to a client [`Ping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    /// Nonce echoed from the ping, if it carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Server time at reply.
    pub at: DateTime<Utc>,
}

/// Client liveness probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    /// Opaque value echoed back in the [`Pong`].
    #[serde(default)]
    pub nonce: Option<u64>,
}

/// Every message the server pushes to clients.
///
/// Serializes as the bare payload; [`super::envelope::encode`] adds the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// A log line.
    LineEvent(Event),
    /// The tailed input failed.
    TailError(TailNotice),
    /// Reply to a ping.
    Pong(Pong),
}

impl Tagged for ServerMessage {
    fn tag(&self) -> &'static str {
        match self {
            Self::LineEvent(_) => tags::LINE_EVENT,
            Self::TailError(_) => tags::TAIL_ERROR,
            Self::Pong(_) => tags::PONG,
        }
    }
}

impl From<Event> for ServerMessage {
    fn from(event: Event) -> Self {
        Self::LineEvent(event)
    }
}
