//! The sink's own operational diagnostics — distinct from the application
//! log traffic the sink exists to persist (spec §7.2). The persister and
//! rotator emit `tracing` events for things like a bad log directory or a
//! short write; this module wires those events to stderr so an operator
//! running the process directly can see them.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a stderr `tracing` subscriber for the sink's internal
/// diagnostics. Honors `RUST_LOG` if set, otherwise defaults to `warn`.
///
/// Safe to call once per process; a second call is a no-op because
/// `tracing` itself only allows one global default subscriber, and the
/// error from trying to set a second one is deliberately discarded here —
/// callers embedding this crate alongside their own subscriber setup
/// should skip calling this at all.
pub fn init_stderr() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_stderr_does_not_panic_on_repeat_calls() {
        init_stderr();
        init_stderr();
    }
}
