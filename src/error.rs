//! Error types for sink construction and configuration.
//!
//! The ingest path itself never surfaces an error to its caller (see
//! `SPEC_FULL.md` §7) — `SinkError` covers only the fallible operations
//! that happen once, at construction time: allocating the initial ring and
//! loading a layered `SinkConfig`.

use thiserror::Error;

/// Convenience alias for results returned by sink construction.
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Errors that can occur while building a [`crate::sink::LogSink`].
#[derive(Error, Debug)]
pub enum SinkError {
    /// The initial ring of cell buffers could not be allocated.
    #[error("failed to allocate initial ring of {count} x {cell_size} byte buffers: {source}")]
    Alloc {
        /// Number of buffers that were being allocated.
        count: usize,
        /// Capacity of each buffer, in bytes.
        cell_size: usize,
        /// Underlying allocation failure.
        #[source]
        source: std::io::Error,
    },

    /// Layered configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// A configuration value was syntactically valid but semantically
    /// nonsensical (e.g. a memory cap smaller than one cell).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error raised while setting up the log directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
