//! Record formatting: the stack-scoped, truncating, non-allocating
//! formatter described in spec §4.3 step 3 and design note "Variadic
//! record formatting".

use std::fmt::{self, Write as _};

use crate::level::Level;

/// Writes into a caller-supplied `&mut [u8]`, silently truncating once the
/// buffer is full. Mirrors the "standard truncating formatter semantics"
/// the spec calls for — never allocates, never panics on overflow.
struct TruncatingWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> TruncatingWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }
}

impl fmt::Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = self.buf.len() - self.len;
        let bytes = s.as_bytes();
        let n = remaining.min(bytes.len());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        Ok(())
    }
}

/// Format `"[LEVEL][utc.ms][tid] file:line(func): "` followed by `args`
/// into `buf`, truncated to `buf.len()` bytes and always terminated with
/// a trailing `\n`. Returns the number of bytes written.
#[allow(clippy::too_many_arguments)]
pub fn format_record(
    buf: &mut [u8],
    level: Level,
    utc_with_millis: &str,
    tid: &str,
    file: &str,
    line: u32,
    func: &str,
    args: fmt::Arguments<'_>,
) -> usize {
    let mut w = TruncatingWriter::new(buf);
    let _ = write!(w, "[{}][{}][{}] {}:{}({}): ", level.tag(), utc_with_millis, tid, file, line, func);
    let _ = w.write_fmt(args);
    let mut len = w.len;

    if len == 0 || buf[len - 1] != b'\n' {
        if len < buf.len() {
            buf[len] = b'\n';
            len += 1;
        } else {
            buf[buf.len() - 1] = b'\n';
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_record_ends_with_newline() {
        let mut buf = [0u8; 256];
        let n = format_record(
            &mut buf,
            Level::Error,
            "2024-01-01 00:00:00.000",
            "tid-1",
            "f.rs",
            42,
            "run",
            format_args!("index={}\n", 7),
        );
        let text = std::str::from_utf8(&buf[..n]).unwrap();
        assert!(text.starts_with("[ERROR][2024-01-01 00:00:00.000][tid-1] f.rs:42(run): "));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn oversized_message_is_truncated_but_still_terminated() {
        let mut buf = [0u8; 64];
        let huge = "x".repeat(4096);
        let n = format_record(
            &mut buf,
            Level::Info,
            "2024-01-01 00:00:00.000",
            "tid-1",
            "f.rs",
            1,
            "run",
            format_args!("{huge}\n"),
        );
        assert!(n <= 64);
        assert_eq!(buf[n - 1], b'\n');
    }
}
