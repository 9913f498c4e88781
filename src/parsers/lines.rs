//! Newline-delimited event parser.
//!
//! [`LineReassembler`] accepts arbitrary byte chunks and emits one
//! [`Event`] per complete line. A line split across several writes is
//! buffered until its newline arrives.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::domain::Event;
use crate::error::{LineWriteError, StreamError};

/// Source of event timestamps.
pub trait Clock: Send {
    /// Returns the current time.
    fn now(&mut self) -> DateTime<Utc>;
}

/// Wall clock backed by [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: FnMut() -> DateTime<Utc> + Send,
{
    fn now(&mut self) -> DateTime<Utc> {
        self()
    }
}

/// Downstream receiver of parsed events.
///
/// Accepting an event may wait. While it does, the reassembler and whatever
/// feeds it wait too, so a slow consumer slows the input down instead of
/// piling events up in memory.
pub trait EventConsumer: Send {
    /// Accepts one event.
    ///
    /// # Errors
    ///
    /// Returns an error when the consumer can take no more events; the
    /// reassembler stops processing the current input.
    fn on(&mut self, event: Event) -> impl Future<Output = Result<(), StreamError>> + Send;
}

impl EventConsumer for mpsc::Sender<Event> {
    async fn on(&mut self, event: Event) -> Result<(), StreamError> {
        self.send(event)
            .await
            .map_err(|_| StreamError::ConsumerClosed)
    }
}

/// Splits a byte stream into line events.
#[derive(Debug)]
pub struct LineReassembler<K, C> {
    source: String,
    clock: K,
    consumer: C,
    partial: Vec<u8>,
}

impl<K: Clock, C: EventConsumer> LineReassembler<K, C> {
    /// Creates a reassembler that stamps events with `source` and the
    /// time reported by `clock`.
    #[must_use]
    pub fn new(source: impl Into<String>, clock: K, consumer: C) -> Self {
        Self {
            source: source.into(),
            clock,
            consumer,
            partial: Vec::new(),
        }
    }

    /// Feeds `bytes` into the reassembler, emitting an event for every
    /// newline found. Returns the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`LineWriteError`] when the consumer rejects an event. The
    /// rest of `bytes` is left unprocessed.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<usize, LineWriteError> {
        let mut consumed = 0;
        for chunk in bytes.split_inclusive(|&b| b == b'\n') {
            consumed += chunk.len();
            let Some(line) = chunk.strip_suffix(b"\n") else {
                self.partial.extend_from_slice(chunk);
                continue;
            };
            self.partial.extend_from_slice(line);
            let message = String::from_utf8_lossy(&self.partial).into_owned();
            self.partial.clear();
            self.submit(message)
                .await
                .map_err(|source| LineWriteError { consumed, source })?;
        }
        Ok(consumed)
    }

    /// Emits whatever is buffered, even if empty, as a final event and
    /// resets the reassembler.
    ///
    /// # Errors
    ///
    /// Returns the consumer's error if it rejects the final event.
    pub async fn close(&mut self) -> Result<(), StreamError> {
        let message = String::from_utf8_lossy(&self.partial).into_owned();
        self.partial.clear();
        self.submit(message).await
    }

    /// Name stamped on every event.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the consumer, dropping any buffered partial line.
    pub fn into_consumer(self) -> C {
        self.consumer
    }

    async fn submit(&mut self, message: String) -> Result<(), StreamError> {
        let event = Event::new(self.source.clone(), self.clock.now(), message);
        self.consumer.on(event).await
    }
}
