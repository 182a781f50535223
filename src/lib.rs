//! # appendlog
//!
//! A high-throughput, asynchronous, process-local application log sink.
//!
//! Producers call [`LogSink::append`] from any thread; the call copies a
//! formatted record into a shared ring of fixed-size buffers and returns
//! without touching disk. A single background thread drains full buffers
//! to a rotating set of files. Under sustained overload the sink grows the
//! ring up to a configured memory cap, and beyond that drops records
//! rather than blocking producers or the process that owns them.
//!
//! ## Crate layout
//!
//! - [`sink`]: the public [`LogSink`] handle and the producer-facing
//!   ingest path.
//! - [`persister`]: the background thread that drains the ring to disk.
//! - [`ring`] / [`cell`]: the buffer ring and its fixed-capacity cells.
//! - [`rotate`]: day- and size-based log file rotation.
//! - [`record`]: the non-allocating record formatter.
//! - [`clock`]: time and thread-id sources, abstracted for deterministic
//!   tests.
//! - [`level`]: the sink's own severity scale and its mapping to [`log`].
//! - [`config`]: layered configuration (defaults, TOML file, environment).
//! - [`error`]: construction-time failure modes.
//! - [`context`]: an optional process-wide ambient sink handle.
//! - [`log_bridge`]: routes the [`log`] crate's global facade into a sink.
//! - [`diagnostics`]: the sink's own operational tracing output.

pub mod cell;
pub mod clock;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod level;
pub mod log_bridge;
pub mod persister;
pub mod record;
pub mod ring;
pub mod rotate;
pub mod sink;

pub use config::SinkConfig;
pub use error::{SinkError, SinkResult};
pub use level::Level;
pub use log_bridge::SinkLogger;
pub use sink::LogSink;

/// Logs a record through the ambient sink installed via
/// [`context::set_ambient`], if one has been installed. Silently a no-op
/// otherwise, mirroring the fire-and-forget semantics of
/// [`LogSink::append`] itself.
#[macro_export]
macro_rules! alog {
    ($level:expr, $($arg:tt)*) => {
        if let Some(sink) = $crate::context::ambient() {
            sink.append($level, file!(), line!(), module_path!(), format_args!($($arg)*));
        }
    };
}
