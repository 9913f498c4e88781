//! Parsers turning raw input bytes into [`crate::domain::Event`]s.

pub mod lines;

pub use lines::{Clock, EventConsumer, LineReassembler, SystemClock};
