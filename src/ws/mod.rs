//! WebSocket layer: connection actors, command routing, command handlers.
//!
//! The endpoint at `/events` streams enveloped log events to the client
//! and accepts tagged commands in the other direction.

pub mod commands;
pub mod connection;
pub mod handler;
pub mod router;

pub use commands::{Discard, PingHandler, command_router};
pub use connection::ConnectionActor;
pub use router::{MessageHandler, MessageRouter};
