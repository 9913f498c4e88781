//! Tailed input: reading bytes, splitting lines, surfacing failures.
//!
//! An input is read once, up to its end. Following a growing file is left
//! to whatever feeds the input (typically `tail -F file | munch`).

pub mod factory;
pub mod source;
pub mod tailer;

pub use factory::{
    InputDefinition, InputFactory, LineParserDefinition, LineParserFactory, LocalInputFactory,
    ParserFactory, SourceDefinition, SourceFactory,
};
pub use source::{DEFAULT_READ_BUFFER, Source};
pub use tailer::{DEFAULT_EVENT_QUEUE, Tailer};
