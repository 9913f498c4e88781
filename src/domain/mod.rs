//! Domain layer: client identity, the client registry, and log events.
//!
//! This module holds the server-side state shared by every connection:
//! the identifier allocator, the registry that fans messages out to
//! connected clients, and the event type produced from tailed input.

pub mod client_id;
pub mod client_registry;
pub mod event;

pub use client_id::{ClientId, ClientIdGenerator};
pub use client_registry::{ClientRegistry, ClientSink};
pub use event::Event;
