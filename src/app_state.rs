//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{ClientIdGenerator, ClientRegistry};
use crate::ws::MessageRouter;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registry of connected clients.
    pub registry: Arc<ClientRegistry>,
    /// Allocator for new connections' identifiers.
    pub ids: Arc<ClientIdGenerator>,
    /// Router for inbound client commands.
    pub router: Arc<MessageRouter>,
    /// Capacity of each client's outbound queue.
    pub client_queue_capacity: usize,
}

impl AppState {
    /// Creates state around `registry` with the standard command router.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>, client_queue_capacity: usize) -> Self {
        let router = Arc::new(crate::ws::command_router(Arc::clone(&registry)));
        Self {
            registry,
            ids: Arc::new(ClientIdGenerator::new()),
            router,
            client_queue_capacity,
        }
    }
}
