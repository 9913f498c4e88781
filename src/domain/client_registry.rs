//! Registry of connected clients and their delivery channels.
//!
//! [`ClientRegistry`] maps each [`ClientId`] to the sending half of that
//! client's bounded outbound queue. The connection actor owns the receiving
//! half and turns each queued message into one WebSocket frame.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

use super::ClientId;
use crate::protocol::ServerMessage;

/// Sending half of a client's delivery channel.
pub type ClientSink = mpsc::Sender<ServerMessage>;

/// Central store of live client subscriptions.
///
/// # Concurrency
///
/// One exclusive lock guards the whole map. Every call holds it for its
/// full duration, including while pushing into subscriber queues, so a
/// broadcast always sees a consistent set of recipients. The cost is that a
/// client whose queue is full stalls every other caller until it drains.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, ClientSink>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink` as the delivery channel for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is already registered. Identifiers come from a
    /// [`super::ClientIdGenerator`]; a repeat means the allocator is broken
    /// and the registry must not silently replace a live channel.
    pub async fn subscribe(&self, id: ClientId, sink: ClientSink) {
        let mut clients = self.clients.lock().await;
        assert!(
            !clients.contains_key(&id),
            "client {id} subscribed twice; identifier allocator is broken"
        );
        clients.insert(id, sink);
        tracing::debug!(client_id = %id, clients = clients.len(), "client subscribed");
    }

    /// Removes `id` and closes its delivery channel. Does nothing if `id`
    /// is not registered.
    pub async fn unsubscribe(&self, id: ClientId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(&id).is_some() {
            tracing::debug!(client_id = %id, clients = clients.len(), "client unsubscribed");
        }
    }

    /// Delivers `msg` to `id` if it is registered; drops it otherwise.
    ///
    /// A client may disconnect between the caller deciding to send and the
    /// send itself, so a missing client is logged rather than reported.
    pub async fn send(&self, id: ClientId, msg: ServerMessage) {
        let clients = self.clients.lock().await;
        let Some(sink) = clients.get(&id) else {
            tracing::debug!(client_id = %id, ?msg, "message for unsubscribed client dropped");
            return;
        };
        if sink.send(msg).await.is_err() {
            tracing::debug!(client_id = %id, "client writer gone; message dropped");
        }
    }

    /// Delivers `msg` to every registered client.
    ///
    /// Returns the number of clients whose queue accepted the message.
    pub async fn broadcast(&self, msg: ServerMessage) -> usize {
        let clients = self.clients.lock().await;
        let mut delivered = 0;
        for (id, sink) in clients.iter() {
            if sink.send(msg.clone()).await.is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(client_id = %id, "client writer gone; broadcast skipped");
            }
        }
        delivered
    }

    /// Unsubscribes every client, closing all delivery channels.
    pub async fn close(&self) {
        let mut clients = self.clients.lock().await;
        let count = clients.len();
        clients.clear();
        tracing::info!(clients = count, "client registry closed");
    }

    /// Returns the number of registered clients.
    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Returns `true` if no client is registered.
    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::domain::{ClientIdGenerator, Event};

    fn line(text: &str) -> ServerMessage {
        ServerMessage::LineEvent(Event::new("test", Utc::now(), text))
    }

    #[tokio::test]
    async fn broadcast_reaches_subscriber_once() {
        let registry = ClientRegistry::new();
        let id = ClientId::from_raw(0);
        let (tx, mut rx) = mpsc::channel(4);
        registry.subscribe(id, tx).await;

        let delivered = registry.broadcast(line("m")).await;
        assert_eq!(delivered, 1);

        let Some(ServerMessage::LineEvent(event)) = rx.recv().await else {
            panic!("expected a line event");
        };
        assert_eq!(event.message, "m");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribed_client_gets_nothing() {
        let registry = ClientRegistry::new();
        let id = ClientId::from_raw(0);
        let (tx, mut rx) = mpsc::channel(4);
        registry.subscribe(id, tx).await;
        registry.unsubscribe(id).await;

        let delivered = registry.broadcast(line("m")).await;
        assert_eq!(delivered, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_closes_channel() {
        let registry = ClientRegistry::new();
        let id = ClientId::from_raw(3);
        let (tx, mut rx) = mpsc::channel(4);
        registry.subscribe(id, tx).await;

        registry.unsubscribe(id).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let registry = ClientRegistry::new();
        let id = ClientId::from_raw(1);
        registry.unsubscribe(id).await;
        let (tx, _rx) = mpsc::channel(1);
        registry.subscribe(id, tx).await;
        registry.unsubscribe(id).await;
        registry.unsubscribe(id).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn send_targets_only_that_client() {
        let registry = ClientRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.subscribe(ClientId::from_raw(0), tx_a).await;
        registry.subscribe(ClientId::from_raw(1), tx_b).await;

        registry.send(ClientId::from_raw(1), line("only b")).await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn send_to_unknown_client_is_dropped() {
        let registry = ClientRegistry::new();
        let sent = tokio::time::timeout(
            Duration::from_secs(1),
            registry.send(ClientId::from_raw(99), line("nobody")),
        )
        .await;
        assert!(sent.is_ok());
    }

    #[tokio::test]
    async fn broadcast_skips_client_with_dropped_receiver() {
        let registry = ClientRegistry::new();
        let (tx_live, mut rx_live) = mpsc::channel(4);
        let (tx_gone, rx_gone) = mpsc::channel(4);
        registry.subscribe(ClientId::from_raw(0), tx_live).await;
        registry.subscribe(ClientId::from_raw(1), tx_gone).await;
        drop(rx_gone);

        assert_eq!(registry.broadcast(line("m")).await, 1);
        assert!(rx_live.recv().await.is_some());
    }

    #[tokio::test]
    async fn close_unsubscribes_everyone() {
        let registry = ClientRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(1);
        let (tx_b, mut rx_b) = mpsc::channel(1);
        registry.subscribe(ClientId::from_raw(0), tx_a).await;
        registry.subscribe(ClientId::from_raw(1), tx_b).await;
        assert_eq!(registry.len().await, 2);

        registry.close().await;

        assert!(registry.is_empty().await);
        assert!(rx_a.recv().await.is_none());
        assert!(rx_b.recv().await.is_none());
    }

    #[tokio::test]
    #[should_panic(expected = "subscribed twice")]
    async fn duplicate_subscribe_panics() {
        let registry = ClientRegistry::new();
        let id = ClientId::from_raw(5);
        let (tx_a, _rx_a) = mpsc::channel(1);
        let (tx_b, _rx_b) = mpsc::channel(1);
        registry.subscribe(id, tx_a).await;
        registry.subscribe(id, tx_b).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_broadcasts_with_mixed_ids_complete() {
        let registry = Arc::new(ClientRegistry::new());
        let ids = ClientIdGenerator::new();
        let mut drains = Vec::new();

        for n in 0..100 {
            let id = ids.next_id();
            // Only every other identifier is ever subscribed.
            if n % 2 == 0 {
                let (tx, mut rx) = mpsc::channel(8);
                registry.subscribe(id, tx).await;
                drains.push(tokio::spawn(async move {
                    let mut seen = 0usize;
                    while rx.recv().await.is_some() {
                        seen += 1;
                    }
                    seen
                }));
            } else {
                registry.send(id, line("stray")).await;
            }
        }

        let mut casts = Vec::new();
        for n in 0..100 {
            let registry = Arc::clone(&registry);
            casts.push(tokio::spawn(async move {
                registry.broadcast(line(&format!("msg {n}"))).await
            }));
        }

        let all = async {
            for cast in casts {
                let Ok(delivered) = cast.await else {
                    panic!("broadcast task panicked");
                };
                assert_eq!(delivered, 50);
            }
        };
        assert!(tokio::time::timeout(Duration::from_secs(10), all).await.is_ok());

        registry.close().await;
        for drain in drains {
            let Ok(seen) = drain.await else {
                panic!("drain task panicked");
            };
            assert_eq!(seen, 100);
        }
    }
}
