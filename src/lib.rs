//! # munch
//!
//! Streams log lines to any number of live WebSocket clients and accepts
//! typed commands back over the same connection.
//!
//! ## Architecture
//!
//! ```text
//! input bytes (file, stdin)
//!     │
//!     ├── SourceFactory → Source + LineReassembler (tail/, parsers/)
//!     ├── Tailer → TailService (tail/, service/)
//!     │
//!     ├── ClientRegistry (domain/)
//!     │
//!     ├── ConnectionActor read/write loops (ws/)
//!     └── Envelope codec + MessageRouter (protocol/, ws/)
//! ```
//!
//! Every frame is a single-key JSON object whose key is the message tag:
//! `{"LineEvent": {"source": "tail", "at": "...", "message": "hello"}}`.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod parsers;
pub mod protocol;
pub mod service;
pub mod tail;
pub mod ws;
