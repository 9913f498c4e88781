//! Building a [`Source`] from a JSON definition.
//!
//! A [`SourceDefinition`] carries two opaque JSON documents, one describing
//! the input and one describing the parser. A [`SourceFactory`] hands each
//! to a pluggable factory and joins the results into a ready [`Source`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tokio::io::AsyncRead;

use super::source::{DEFAULT_READ_BUFFER, Source};
use crate::error::StreamError;
use crate::parsers::{Clock, EventConsumer, LineReassembler, SystemClock};

/// Recipe for one source. Each half is interpreted by its own factory.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Handed to the [`InputFactory`] unparsed.
    pub input: Box<RawValue>,
    /// Handed to the [`ParserFactory`] unparsed.
    pub parser: Box<RawValue>,
}

impl SourceDefinition {
    /// Parses a definition from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Definition`] unless `json` is an object with
    /// both an `input` and a `parser` member.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        serde_json::from_str(json).map_err(StreamError::Definition)
    }

    /// Serializes both halves into a definition.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Definition`] if either half fails to serialize.
    pub fn from_parts<I, P>(input: &I, parser: &P) -> Result<Self, StreamError>
    where
        I: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        Ok(Self {
            input: serde_json::value::to_raw_value(input).map_err(StreamError::Definition)?,
            parser: serde_json::value::to_raw_value(parser).map_err(StreamError::Definition)?,
        })
    }
}

/// Opens inputs described by JSON definitions.
pub trait InputFactory: Sync {
    /// Byte stream produced by this factory. Dropping it closes it.
    type Input: AsyncRead + Unpin + Send + 'static;

    /// Opens the input described by `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Definition`] for a definition this factory
    /// does not understand, or the error raised while opening the input.
    fn new_input(
        &self,
        definition: &RawValue,
    ) -> impl Future<Output = Result<Self::Input, StreamError>> + Send;
}

/// Builds line parsers described by JSON definitions.
pub trait ParserFactory {
    /// Timestamp source of the parsers built here.
    type Timestamps: Clock + 'static;

    /// Builds the parser described by `definition`, delivering its events
    /// to `consumer`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Definition`] for a definition this factory
    /// does not understand.
    fn new_parser<C: EventConsumer>(
        &self,
        definition: &RawValue,
        consumer: C,
    ) -> Result<LineReassembler<Self::Timestamps, C>, StreamError>;
}

/// Joins an [`InputFactory`] and a [`ParserFactory`].
#[derive(Debug)]
pub struct SourceFactory<I, P> {
    inputs: I,
    parsers: P,
    read_buffer: usize,
}

impl<I: InputFactory, P: ParserFactory> SourceFactory<I, P> {
    /// Creates a factory drawing on `inputs` and `parsers`.
    #[must_use]
    pub fn new(inputs: I, parsers: P) -> Self {
        Self {
            inputs,
            parsers,
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }

    /// Read size for the sources built here. Zero is raised to one.
    #[must_use]
    pub fn with_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer = bytes.max(1);
        self
    }

    /// Opens the input, then builds the parser around `consumer`.
    ///
    /// If the parser cannot be built, the input is closed before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by either factory.
    pub async fn new_source<C: EventConsumer>(
        &self,
        definition: &SourceDefinition,
        consumer: C,
    ) -> Result<Source<I::Input, P::Timestamps, C>, StreamError> {
        let input = self.inputs.new_input(&definition.input).await?;
        let lines = match self.parsers.new_parser(&definition.parser, consumer) {
            Ok(lines) => lines,
            Err(err) => {
                drop(input);
                return Err(err);
            }
        };
        Ok(Source::new(input, lines).with_read_buffer(self.read_buffer))
    }
}

/// Inputs understood by [`LocalInputFactory`].
///
/// On the wire: `"stdin"` or `{"file": {"path": "/var/log/app.log"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDefinition {
    /// The process's standard input.
    Stdin,
    /// A file, read once from start to end.
    File {
        /// Path of the file.
        path: PathBuf,
    },
}

/// Opens standard input or a local file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalInputFactory;

impl InputFactory for LocalInputFactory {
    type Input = Box<dyn AsyncRead + Unpin + Send>;

    async fn new_input(&self, definition: &RawValue) -> Result<Self::Input, StreamError> {
        let definition: InputDefinition =
            serde_json::from_str(definition.get()).map_err(StreamError::Definition)?;
        match definition {
            InputDefinition::Stdin => Ok(Box::new(tokio::io::stdin())),
            InputDefinition::File { path } => {
                let file = tokio::fs::File::open(&path).await?;
                tracing::debug!(path = %path.display(), "opened tail file");
                Ok(Box::new(file))
            }
        }
    }
}

/// Parser options understood by [`LineParserFactory`].
///
/// `null` or `{}` keeps the factory's default source name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineParserDefinition {
    /// Name stamped on every event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Builds newline-delimited parsers stamped with the wall clock.
#[derive(Debug, Clone)]
pub struct LineParserFactory {
    default_source: String,
}

impl LineParserFactory {
    /// Creates a factory naming events `default_source` unless a definition
    /// says otherwise.
    #[must_use]
    pub fn new(default_source: impl Into<String>) -> Self {
        Self {
            default_source: default_source.into(),
        }
    }
}

impl ParserFactory for LineParserFactory {
    type Timestamps = SystemClock;

    fn new_parser<C: EventConsumer>(
        &self,
        definition: &RawValue,
        consumer: C,
    ) -> Result<LineReassembler<SystemClock, C>, StreamError> {
        let definition: Option<LineParserDefinition> =
            serde_json::from_str(definition.get()).map_err(StreamError::Definition)?;
        let source = definition
            .and_then(|def| def.source)
            .unwrap_or_else(|| self.default_source.clone());
        Ok(LineReassembler::new(source, SystemClock, consumer))
    }
}
