//! Error types for the event stream.
//!
//! [`StreamError`] is the central error type of the service. The envelope
//! codec reports [`EnvelopeError`], and the line reassembler wraps consumer
//! failures in [`LineWriteError`] so callers learn how much input was taken.

/// Failure to encode or decode a tagged JSON envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// Input was not valid JSON, or was JSON but not an object.
    #[error("invalid envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// Input was a JSON object with a key count other than one.
    #[error("envelope must have exactly one key, got {0}")]
    KeyCount(usize),
}

/// Service-wide error enum.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The downstream event consumer went away.
    #[error("event consumer closed")]
    ConsumerClosed,

    /// Reading the tailed input failed.
    #[error("tail input error: {0}")]
    Io(#[from] std::io::Error),

    /// A wire envelope could not be built or parsed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// A configuration value was present but unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An input or parser definition did not match what its factory accepts.
    #[error("invalid source definition: {0}")]
    Definition(#[source] serde_json::Error),
}

/// A consumer failure raised while the reassembler was splitting input.
///
/// `consumed` counts the bytes taken from the failing `write` call, up to
/// and including the newline of the line whose event was rejected.
#[derive(Debug, thiserror::Error)]
#[error("event consumer failed after {consumed} bytes: {source}")]
pub struct LineWriteError {
    /// Bytes consumed before processing stopped.
    pub consumed: usize,
    /// Error reported by the consumer.
    #[source]
    pub source: StreamError,
}
