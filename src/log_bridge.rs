//! Bridges the [`log`] crate's global facade into a [`LogSink`] (spec §4.7).
//!
//! Call sites that already use `log::info!` and friends can route through
//! the sink without changing a single call site: install [`SinkLogger`] as
//! the global logger and it forwards accepted records into the sink's
//! `append` fast path.

use log::{Log, Metadata, Record};

use crate::level::Level;
use crate::sink::LogSink;

/// Adapts a [`LogSink`] to the [`log::Log`] trait.
pub struct SinkLogger {
    sink: LogSink,
}

impl SinkLogger {
    /// Wrap `sink` as a `log::Log` implementation.
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    /// Install `sink` as the global `log` logger, and raise the `log`
    /// crate's max level to match the sink's configured threshold so
    /// filtered-out records don't pay formatting cost upstream.
    pub fn install(sink: LogSink) -> Result<(), log::SetLoggerError> {
        log::set_max_level(level_to_filter(sink.level()));
        let logger = Box::new(Self::new(sink));
        log::set_boxed_logger(logger)
    }
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        Level::from(metadata.level()).passes(self.sink.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = Level::from(record.level());
        let file = record.file().unwrap_or("<unknown>");
        let line = record.line().unwrap_or(0);
        let target = record.target();
        self.sink.append(level, file, line, target, *record.args());
    }

    fn flush(&self) {}
}

fn level_to_filter(level: Level) -> log::LevelFilter {
    match level {
        Level::Fatal | Level::Error => log::LevelFilter::Error,
        Level::Warn => log::LevelFilter::Warn,
        Level::Info => log::LevelFilter::Info,
        Level::Debug => log::LevelFilter::Debug,
        Level::Trace => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkConfig;

    #[test]
    fn enabled_respects_configured_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogSink::init(dir.path(), "bridge-test", Level::Warn, SinkConfig::default())
            .unwrap();
        let logger = SinkLogger::new(sink.clone());

        assert!(logger.enabled(&Metadata::builder().level(log::Level::Error).build()));
        assert!(!logger.enabled(&Metadata::builder().level(log::Level::Info).build()));
        sink.shutdown();
    }
}
