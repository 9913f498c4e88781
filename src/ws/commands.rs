//! Handlers for client-to-server commands.

use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::value::RawValue;

use super::router::{MessageHandler, MessageRouter};
use crate::domain::{ClientId, ClientRegistry};
use crate::protocol::{Ping, Pong, ServerMessage, tags};

/// Accepts any payload and does nothing with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl MessageHandler for Discard {
    fn on_message<'a>(&'a self, _id: ClientId, _payload: &'a RawValue) -> BoxFuture<'a, ()> {
        async {}.boxed()
    }
}

/// Answers a `Ping` with a `Pong` sent only to the pinging client.
#[derive(Debug, Clone)]
pub struct PingHandler {
    registry: Arc<ClientRegistry>,
}

impl PingHandler {
    /// Creates a handler replying through `registry`.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }
}

impl MessageHandler for PingHandler {
    fn on_message<'a>(&'a self, id: ClientId, payload: &'a RawValue) -> BoxFuture<'a, ()> {
        async move {
            let ping: Ping = match serde_json::from_str(payload.get()) {
                Ok(ping) => ping,
                Err(err) => {
                    tracing::warn!(client_id = %id, error = %err, "client sent invalid ping");
                    return;
                }
            };
            let pong = Pong {
                nonce: ping.nonce,
                at: Utc::now(),
            };
            self.registry.send(id, ServerMessage::Pong(pong)).await;
        }
        .boxed()
    }
}

/// Builds the router for every client command in the tag table.
#[must_use]
pub fn command_router(registry: Arc<ClientRegistry>) -> MessageRouter {
    let ping: Arc<dyn MessageHandler> = Arc::new(PingHandler::new(registry));
    let heartbeat: Arc<dyn MessageHandler> = Arc::new(Discard);
    MessageRouter::new([(tags::PING, ping), (tags::HEARTBEAT, heartbeat)])
}
