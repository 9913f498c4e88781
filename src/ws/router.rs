//! Inbound message routing by envelope tag.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::value::RawValue;

use crate::domain::ClientId;
use crate::protocol::envelope;

/// Handles the payload of one tag.
///
/// Returns a boxed future so handlers of different types can share one
/// routing table.
pub trait MessageHandler: Send + Sync {
    /// Processes one unwrapped payload sent by `id`.
    fn on_message<'a>(&'a self, id: ClientId, payload: &'a RawValue) -> BoxFuture<'a, ()>;
}

/// Dispatches decoded envelopes to the handler registered for their tag.
///
/// Malformed frames and unknown tags are logged and dropped; they never
/// reach a handler.
#[derive(Default)]
pub struct MessageRouter {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl MessageRouter {
    /// Creates a router from `(tag, handler)` pairs.
    #[must_use]
    pub fn new<I, S>(handlers: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn MessageHandler>)>,
        S: Into<String>,
    {
        Self {
            handlers: handlers
                .into_iter()
                .map(|(tag, handler)| (tag.into(), handler))
                .collect(),
        }
    }

    /// Decodes `raw` and invokes the matching handler exactly once.
    pub async fn on_message(&self, id: ClientId, raw: &[u8]) {
        let envelope = match envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(
                    client_id = %id,
                    error = %err,
                    raw = %String::from_utf8_lossy(raw),
                    "client sent invalid message"
                );
                return;
            }
        };

        let Some(handler) = self.handlers.get(&envelope.tag) else {
            tracing::warn!(client_id = %id, tag = %envelope.tag, "client sent message with unexpected tag");
            return;
        };

        handler.on_message(id, &envelope.payload).await;
    }

    /// Returns `true` if a handler is registered for `tag`.
    #[must_use]
    pub fn handles(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.handlers.keys().collect();
        tags.sort();
        f.debug_struct("MessageRouter").field("tags", &tags).finish()
    }
}
