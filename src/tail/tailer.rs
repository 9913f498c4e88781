//! Background tailer yielding events and the first input error.

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::factory::{InputFactory, ParserFactory, SourceDefinition, SourceFactory};
use super::source::Source;
use crate::domain::Event;
use crate::error::StreamError;
use crate::parsers::{Clock, LineReassembler, SystemClock};

/// Events a tailer may hold before its source stops reading.
pub const DEFAULT_EVENT_QUEUE: usize = 256;

/// Runs a [`Source`] on its own task and hands out what it produces.
///
/// Events come out in input order. If the source fails, its error is
/// yielded once, after every event parsed before the failure. The event
/// queue is bounded: while it is full the source does not read.
#[derive(Debug)]
pub struct Tailer {
    source: String,
    events: mpsc::Receiver<Event>,
    error: Option<oneshot::Receiver<StreamError>>,
    task: JoinHandle<()>,
}

impl Tailer {
    /// Builds a source from `definition` and starts tailing it.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if the input cannot be opened or the
    /// parser cannot be built.
    pub async fn open<I, P>(
        factory: &SourceFactory<I, P>,
        definition: &SourceDefinition,
        queue_capacity: usize,
    ) -> Result<Self, StreamError>
    where
        I: InputFactory,
        P: ParserFactory,
    {
        let (events_tx, events) = mpsc::channel(queue_capacity.max(1));
        let source = factory.new_source(definition, events_tx).await?;
        Ok(Self::spawn(source, events))
    }

    /// Starts tailing `input` with a line parser stamping events with
    /// `source` and the wall clock.
    #[must_use]
    pub fn from_reader<R>(
        input: R,
        source: impl Into<String>,
        read_buffer: usize,
        queue_capacity: usize,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (events_tx, events) = mpsc::channel(queue_capacity.max(1));
        let lines = LineReassembler::new(source, SystemClock, events_tx);
        Self::spawn(Source::new(input, lines).with_read_buffer(read_buffer), events)
    }

    /// Runs `pump` in the background. `events` must be the receiving end of
    /// the channel `pump` delivers to.
    #[must_use]
    pub fn spawn<R, K>(pump: Source<R, K, mpsc::Sender<Event>>, events: mpsc::Receiver<Event>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        K: Clock + 'static,
    {
        let source = pump.name().to_string();
        let (error_tx, error) = oneshot::channel();

        let name = source.clone();
        let task = tokio::spawn(async move {
            match pump.process().await {
                Ok(()) => tracing::warn!(
                    source = %name,
                    "tail input reached its end and is not followed; \
                     pipe `tail -F <file>` into munch to stream a growing file"
                ),
                Err(err) => {
                    tracing::warn!(source = %name, error = %err, "tail input failed");
                    let _ = error_tx.send(err);
                }
            }
        });

        Self {
            source,
            events,
            error: Some(error),
            task,
        }
    }

    /// Name stamped on this tailer's events.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Waits for the next event or error.
    ///
    /// Returns `None` once the input is exhausted or the tailer was closed
    /// and every pending item has been yielded.
    pub async fn next(&mut self) -> Option<Result<Event, StreamError>> {
        if let Some(event) = self.events.recv().await {
            return Some(Ok(event));
        }
        // Resolves when the task ends: a clean or aborted run drops the sender.
        let error = self.error.take()?;
        error.await.ok().map(Err)
    }

    /// Stops the background task. Events already parsed stay readable.
    pub fn close(&mut self) {
        self.task.abort();
    }
}

impl Drop for Tailer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
