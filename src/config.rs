//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::StreamError;
use crate::tail::{
    DEFAULT_EVENT_QUEUE, DEFAULT_READ_BUFFER, InputDefinition, LineParserDefinition,
    SourceDefinition,
};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`StreamConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// File to stream. `None` reads standard input.
    ///
    /// The file is read once, up to its current end, and is not followed
    /// afterwards. To stream a file that keeps growing, leave this unset
    /// and pipe `tail -F <file>` into munch instead.
    pub tail_path: Option<PathBuf>,

    /// Full JSON source definition. Takes precedence over `tail_path` and
    /// `tail_source_name` when set.
    pub tail_source: Option<String>,

    /// Name stamped on every event as its `source`.
    pub tail_source_name: String,

    /// Bytes requested per read from the tailed input.
    pub tail_read_buffer: usize,

    /// Events parsed ahead of the broadcast before reading stops.
    pub tail_queue_capacity: usize,

    /// Messages each client may have queued before broadcasts wait on it.
    pub client_queue_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            tail_path: None,
            tail_source: None,
            tail_source_name: "tail".to_string(),
            tail_read_buffer: DEFAULT_READ_BUFFER,
            tail_queue_capacity: DEFAULT_EVENT_QUEUE,
            client_queue_capacity: 64,
            log_format: LogFormat::Text,
        }
    }
}

impl StreamConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Config`] if `LISTEN_ADDR` is set but cannot
    /// be parsed as a [`SocketAddr`], or if `LOG_FORMAT` is neither `text`
    /// nor `json`.
    pub fn from_env() -> Result<Self, StreamError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StreamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|err| StreamError::Config(format!("LISTEN_ADDR {raw:?}: {err}")))?,
            None => defaults.listen_addr,
        };

        let tail_path = lookup("TAIL_PATH")
            .filter(|path| !path.is_empty() && path != "-")
            .map(PathBuf::from);

        let tail_source = lookup("TAIL_SOURCE").filter(|def| !def.trim().is_empty());
        let tail_source_name = lookup("TAIL_SOURCE_NAME").unwrap_or(defaults.tail_source_name);

        let tail_read_buffer =
            parse_or(&lookup, "TAIL_READ_BUFFER_BYTES", defaults.tail_read_buffer).max(1);
        let tail_queue_capacity =
            parse_or(&lookup, "TAIL_QUEUE_CAPACITY", defaults.tail_queue_capacity).max(1);
        let client_queue_capacity =
            parse_or(&lookup, "CLIENT_QUEUE_CAPACITY", defaults.client_queue_capacity).max(1);

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("" | "text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(StreamError::Config(format!(
                    "LOG_FORMAT {other:?}: expected \"text\" or \"json\""
                )));
            }
        };

        Ok(Self {
            listen_addr,
            tail_path,
            tail_source,
            tail_source_name,
            tail_read_buffer,
            tail_queue_capacity,
            client_queue_capacity,
            log_format,
        })
    }

    /// Definition of the tailed source.
    ///
    /// `tail_source` is used verbatim when set. Otherwise the input is
    /// `tail_path` (or standard input) and the parser is named
    /// `tail_source_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Definition`] if `tail_source` is not a valid
    /// definition.
    pub fn source_definition(&self) -> Result<SourceDefinition, StreamError> {
        if let Some(json) = &self.tail_source {
            return SourceDefinition::from_json(json);
        }
        let input = match &self.tail_path {
            Some(path) => InputDefinition::File { path: path.clone() },
            None => InputDefinition::Stdin,
        };
        let parser = LineParserDefinition {
            source: Some(self.tail_source_name.clone()),
        };
        SourceDefinition::from_parts(&input, &parser)
    }
}

/// Parses `key` as `T`, returning `default` on missing or invalid values.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
