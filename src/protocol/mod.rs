//! Wire protocol: tagged envelopes and the message tag table.

pub mod envelope;
pub mod messages;

pub use envelope::{Envelope, Tagged, decode, encode};
pub use messages::{PROTOCOL_VERSION, Ping, Pong, ServerMessage, TailNotice, tags};
