//! Pumps an async byte stream through a [`LineReassembler`].

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::StreamError;
use crate::parsers::{Clock, EventConsumer, LineReassembler};

/// Default read size for [`Source::process`].
pub const DEFAULT_READ_BUFFER: usize = 8 * 1024;

/// Copies everything from `input` into a line parser.
#[derive(Debug)]
pub struct Source<R, K, C> {
    input: R,
    lines: LineReassembler<K, C>,
    read_buffer: usize,
}

impl<R, K, C> Source<R, K, C>
where
    R: AsyncRead + Unpin,
    K: Clock,
    C: EventConsumer,
{
    /// Creates a source reading `input` into `lines`.
    #[must_use]
    pub fn new(input: R, lines: LineReassembler<K, C>) -> Self {
        Self {
            input,
            lines,
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }

    /// Sets how many bytes are requested per read. Zero is raised to one.
    #[must_use]
    pub fn with_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer = bytes.max(1);
        self
    }

    /// Name stamped on the events this source produces.
    #[must_use]
    pub fn name(&self) -> &str {
        self.lines.source()
    }

    /// Reads `input` until end of stream, then flushes the last partial
    /// line as a final event. No further read is issued while the consumer
    /// is still taking the previous chunk's events.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Io`] if reading fails, or the consumer's
    /// error if it stops accepting events. Nothing is flushed on error.
    pub async fn process(mut self) -> Result<(), StreamError> {
        let mut buf = vec![0u8; self.read_buffer];
        loop {
            let n = self.input.read(&mut buf).await?;
            if n == 0 {
                return self.lines.close().await;
            }
            let chunk = buf.get(..n).unwrap_or_default();
            self.lines.write(chunk).await.map_err(|err| err.source)?;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;

    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::Event;
    use crate::parsers::SystemClock;

    fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event.message);
        }
        out
    }

    #[tokio::test]
    async fn copies_all_input_and_flushes_tail() {
        let (tx, mut rx) = mpsc::channel(16);
        let input = tokio_test::io::Builder::new()
            .read(b"ab")
            .read(b"cd\nef")
            .read(b"\ngh")
            .build();
        let source = Source::new(input, LineReassembler::new("t", SystemClock, tx));

        assert!(source.process().await.is_ok());
        assert_eq!(drain(&mut rx), ["abcd", "ef", "gh"]);
    }

    #[tokio::test]
    async fn small_read_buffer_still_reassembles() {
        let (tx, mut rx) = mpsc::channel(16);
        let source = Source::new(&b"first\nsecond\n"[..], LineReassembler::new("t", SystemClock, tx))
            .with_read_buffer(3);

        assert!(source.process().await.is_ok());
        assert_eq!(drain(&mut rx), ["first", "second", ""]);
    }

    #[tokio::test]
    async fn read_error_is_returned() {
        let (tx, mut rx) = mpsc::channel(16);
        let input = tokio_test::io::Builder::new()
            .read(b"kept\npartial")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let source = Source::new(input, LineReassembler::new("t", SystemClock, tx));

        let Err(StreamError::Io(err)) = source.process().await else {
            panic!("expected io error");
        };
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(drain(&mut rx), ["kept"]);
    }

    #[tokio::test]
    async fn closed_consumer_stops_processing() {
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let source = Source::new(&b"line\n"[..], LineReassembler::new("t", SystemClock, tx));

        assert!(matches!(
            source.process().await,
            Err(StreamError::ConsumerClosed)
        ));
    }

    #[tokio::test]
    async fn reading_waits_for_the_consumer() {
        let (tx, mut rx) = mpsc::channel(1);
        let (mut writer, reader) = tokio::io::duplex(8);
        let source = Source::new(reader, LineReassembler::new("t", SystemClock, tx)).with_read_buffer(4);
        let pump = tokio::spawn(source.process());
        let feed = tokio::spawn(async move {
            let written = writer.write_all(b"l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n").await;
            written.is_ok()
        });

        // Nobody takes events, so the source stops reading and the pipe fills.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!feed.is_finished(), "input kept flowing with the event queue full");

        let mut got = Vec::new();
        while let Some(event) = rx.recv().await {
            got.push(event.message);
        }
        assert_eq!(got, ["l1", "l2", "l3", "l4", "l5", "l6", "l7", "l8", ""]);
        assert!(matches!(feed.await, Ok(true)));
        assert!(matches!(pump.await, Ok(Ok(()))));
    }
}
