//! Tail service: forwards tailed events to every connected client.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::ClientRegistry;
use crate::error::StreamError;
use crate::protocol::{ServerMessage, TailNotice};
use crate::tail::Tailer;

/// Bridge between a [`Tailer`] and the [`ClientRegistry`].
///
/// Each event becomes one `LineEvent` broadcast. The first tail error is
/// broadcast as a `TailError` notice and ends the bridge.
#[derive(Debug)]
pub struct TailService {
    tailer: Tailer,
    registry: Arc<ClientRegistry>,
}

impl TailService {
    /// Creates a new `TailService`.
    #[must_use]
    pub fn new(tailer: Tailer, registry: Arc<ClientRegistry>) -> Self {
        Self { tailer, registry }
    }

    /// Broadcasts events until the tailer ends or fails.
    ///
    /// # Errors
    ///
    /// Returns the tailer's first error after notifying clients of it.
    pub async fn run(mut self) -> Result<(), StreamError> {
        while let Some(item) = self.tailer.next().await {
            match item {
                Ok(event) => {
                    let delivered = self.registry.broadcast(ServerMessage::LineEvent(event)).await;
                    tracing::trace!(delivered, "line broadcast");
                }
                Err(err) => {
                    let notice = TailNotice {
                        source: self.tailer.source().to_string(),
                        at: Utc::now(),
                        message: err.to_string(),
                    };
                    self.registry.broadcast(ServerMessage::TailError(notice)).await;
                    self.tailer.close();
                    return Err(err);
                }
            }
        }
        tracing::info!(source = self.tailer.source(), "tailer closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;

    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::ClientId;

    #[tokio::test]
    async fn broadcasts_each_line() {
        let registry = Arc::new(ClientRegistry::new());
        let (tx, mut rx) = mpsc::channel(8);
        registry.subscribe(ClientId::from_raw(0), tx).await;

        let tailer = Tailer::from_reader(&b"alpha\nbeta"[..], "tail", 64, 8);
        let result = TailService::new(tailer, Arc::clone(&registry)).run().await;
        assert!(result.is_ok());

        let mut got = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let ServerMessage::LineEvent(event) = msg else {
                panic!("expected line events only");
            };
            got.push(event.message);
        }
        assert_eq!(got, ["alpha", "beta"]);
    }

    #[tokio::test]
    async fn tail_error_is_broadcast_and_returned() {
        let registry = Arc::new(ClientRegistry::new());
        let (tx, mut rx) = mpsc::channel(8);
        registry.subscribe(ClientId::from_raw(0), tx).await;

        let input = tokio_test::io::Builder::new()
            .read_error(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            .build();
        let tailer = Tailer::from_reader(input, "syslog", 64, 8);
        let result = TailService::new(tailer, Arc::clone(&registry)).run().await;
        assert!(matches!(result, Err(StreamError::Io(_))));

        let Ok(ServerMessage::TailError(notice)) = rx.try_recv() else {
            panic!("expected a tail error notice");
        };
        assert_eq!(notice.source, "syslog");
        assert!(notice.message.contains("denied"));
    }
}
