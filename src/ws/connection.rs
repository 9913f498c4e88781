//! WebSocket connection actor.
//!
//! Each accepted socket gets one [`ConnectionActor`] running a read loop
//! and a write loop side by side. Whichever loop ends first tears the
//! other one down, and [`ConnectionActor::run`] returns only once both
//! have stopped.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ClientId, ClientIdGenerator, ClientRegistry};
use crate::protocol::{ServerMessage, envelope};
use crate::ws::router::MessageRouter;

/// One live client connection.
#[derive(Debug)]
pub struct ConnectionActor {
    id: ClientId,
    registry: Arc<ClientRegistry>,
    router: Arc<MessageRouter>,
    outbound: mpsc::Receiver<ServerMessage>,
}

impl ConnectionActor {
    /// Allocates a client identifier and subscribes a fresh delivery
    /// channel of `queue_capacity` messages for it.
    ///
    /// # Panics
    ///
    /// Panics if `ids` hands out an identifier that is already registered.
    pub async fn accept(
        ids: &ClientIdGenerator,
        registry: Arc<ClientRegistry>,
        router: Arc<MessageRouter>,
        queue_capacity: usize,
    ) -> Self {
        let id = ids.next_id();
        let (sink, outbound) = mpsc::channel(queue_capacity.max(1));
        registry.subscribe(id, sink).await;
        tracing::info!(client_id = %id, "client connected");
        Self {
            id,
            registry,
            router,
            outbound,
        }
    }

    /// Identifier allocated to this connection.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Drives the connection until either side ends it.
    ///
    /// When the read loop stops, the client is unsubscribed while the write
    /// loop keeps running: a broadcast blocked on this client's full queue
    /// holds the registry lock, and only the write loop can make room or,
    /// by failing, drop the queue. Once unsubscribed, the channel closes and
    /// the write loop drains what is left and closes the socket. When the
    /// write loop stops first, its queue is already gone, the client is
    /// unsubscribed and the read half is dropped along with the connection.
    pub async fn run(self, socket: WebSocket) {
        let Self {
            id,
            registry,
            router,
            outbound,
        } = self;
        let (ws_tx, ws_rx) = socket.split();

        let reader = read_loop(id, ws_rx, &router);
        let writer = write_loop(id, ws_tx, outbound);
        tokio::pin!(reader, writer);

        tokio::select! {
            () = &mut reader => {
                tokio::join!(registry.unsubscribe(id), &mut writer);
            }
            () = &mut writer => {
                registry.unsubscribe(id).await;
            }
        }

        tracing::info!(client_id = %id, "client disconnected");
    }
}

/// Forwards every inbound data frame to the router until the peer closes
/// or the transport fails.
async fn read_loop(id: ClientId, mut ws_rx: SplitStream<WebSocket>, router: &MessageRouter) {
    loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => router.on_message(id, text.as_str().as_bytes()).await,
            Some(Ok(Message::Binary(bytes))) => router.on_message(id, &bytes).await,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(client_id = %id, ?frame, "client closed connection");
                return;
            }
            Some(Err(err)) => {
                tracing::debug!(client_id = %id, error = %err, "client read error");
                return;
            }
            None => {
                tracing::debug!(client_id = %id, "client stream ended");
                return;
            }
        }
    }
}

/// Writes every queued message as one enveloped text frame until the
/// queue closes or a write fails, then closes the socket.
async fn write_loop(
    id: ClientId,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<ServerMessage>,
) {
    while let Some(msg) = outbound.recv().await {
        let json = match envelope::encode(&msg) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(client_id = %id, error = %err, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(err) = ws_tx.send(Message::text(json)).await {
            tracing::debug!(client_id = %id, error = %err, "client write error");
            return;
        }
    }
    if let Err(err) = ws_tx.close().await {
        tracing::debug!(client_id = %id, error = %err, "client close error");
    }
}
