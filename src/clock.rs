//! Time and thread-identity collaborators.
//!
//! The buffered pipeline in [`crate::sink`] treats the wall clock and the
//! thread identifier as external collaborators (never read the OS clock
//! directly from the hot path in tests). [`ClockSource`] and
//! [`ThreadIdSource`] are the seams; [`SystemClock`] and [`StdThreadId`] are
//! the production defaults.

use std::fmt::Write as _;
use std::thread;

/// A point in time as the ingest path needs it: whole seconds for the
/// drop-cooldown comparison, and a fully formatted `"YYYY-MM-DD hh:mm:ss.mmm"`
/// string for the record prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Unix seconds, used for cooldown and day-rollover comparisons.
    pub unix_secs: i64,
    /// Millisecond-of-second component (0..1000).
    pub millis: u32,
    /// Calendar date, used by the file rotator to detect day changes.
    pub date: (i32, u32, u32),
}

impl Timestamp {
    /// Render the `"YYYY-MM-DD hh:mm:ss.mmm"` prefix used in record text.
    pub fn format_with_millis(&self, utc_string: &str) -> String {
        let mut out = String::with_capacity(utc_string.len() + 4);
        out.push_str(utc_string);
        let _ = write!(out, ".{:03}", self.millis);
        out
    }
}

/// Supplies wall-clock readings to the sink. Kept as a trait so tests can
/// drive the drop-cooldown and day-rollover logic deterministically.
pub trait ClockSource: Send + Sync {
    /// Current time, plus the formatted `"YYYY-MM-DD hh:mm:ss"` UTC string.
    fn now(&self) -> (Timestamp, String);
}

/// The production clock: `chrono::Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> (Timestamp, String) {
        let now = chrono::Utc::now();
        let ts = Timestamp {
            unix_secs: now.timestamp(),
            millis: now.timestamp_subsec_millis(),
            date: (now.format("%Y").to_string().parse().unwrap_or(1970),
                   now.format("%m").to_string().parse().unwrap_or(1),
                   now.format("%d").to_string().parse().unwrap_or(1)),
        };
        let formatted = now.format("%Y-%m-%d %H:%M:%S").to_string();
        (ts, formatted)
    }
}

/// Supplies a per-thread identifier for the `[tid]` record field.
pub trait ThreadIdSource: Send + Sync {
    /// A short, human-readable thread identifier.
    fn current(&self) -> String;
}

/// The production thread-id source: the OS thread name if set, else the
/// std `ThreadId` debug form.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdThreadId;

impl ThreadIdSource for StdThreadId {
    fn current(&self) -> String {
        let current = thread::current();
        match current.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", current.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_formats_date() {
        let (ts, s) = SystemClock.now();
        assert_eq!(s.len(), "2024-01-01 00:00:00".len());
        assert!(ts.date.0 > 2000);
    }

    #[test]
    fn std_thread_id_is_nonempty() {
        assert!(!StdThreadId.current().is_empty());
    }
}
