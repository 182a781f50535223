//! The optional ambient sink slot.
//!
//! The spec's original source is a process-wide singleton with lazy
//! one-shot init (design note §9). The rewrite's primary API is an
//! explicitly constructed, `Clone`-able [`crate::sink::LogSink`] handle —
//! this module exists only as an ergonomic convenience for call sites
//! that cannot conveniently carry that handle (chiefly the [`log`] crate
//! bridge in [`crate::log_bridge`]), not as the only way to reach a sink.

use once_cell::sync::OnceCell;

use crate::sink::LogSink;

static AMBIENT: OnceCell<LogSink> = OnceCell::new();

/// Install `sink` as the process-wide ambient sink. Returns `Err(sink)`
/// if one was already installed — the slot is set-once, like the `log`
/// crate's own global logger.
pub fn set_ambient(sink: LogSink) -> Result<(), LogSink> {
    AMBIENT.set(sink)
}

/// The ambient sink, if one has been installed.
pub fn ambient() -> Option<&'static LogSink> {
    AMBIENT.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkConfig;
    use crate::level::Level;

    #[test]
    fn ambient_starts_unset_in_isolation() {
        // This crate's test binary runs many tests in the same process,
        // so we only assert the getter doesn't panic, not emptiness.
        let _ = ambient();
    }

    #[test]
    fn set_ambient_is_idempotent_failure() {
        if ambient().is_some() {
            return; // another test already installed one; nothing to check here
        }
        let dir = tempfile::tempdir().unwrap();
        let sink = LogSink::init(dir.path(), "ambient-test", Level::Info, SinkConfig::default())
            .unwrap();
        let sink2 = sink.clone();
        assert!(set_ambient(sink).is_ok());
        assert!(set_ambient(sink2).is_err());
    }
}
