//! Fixed-capacity append-only byte buffer — the unit of handoff between
//! producers and the persister (spec §3, §4.1).

use std::io::{self, Write};

/// Producer-writable vs persister-owned. Mutated only under the ring's
/// mutex ([`crate::ring::BufferRing`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    /// A producer may append into this cell.
    Free,
    /// The persister owns this cell's contents until it calls [`Cell::clear`].
    Full,
}

/// A fixed-capacity append-only byte region.
///
/// Invariants (spec §3): written only while `status == Free`; read only
/// while `status == Full`; `used` is monotonic between `clear` calls;
/// appended records never cross the buffer boundary (callers must check
/// [`Cell::avail`] before calling [`Cell::append`]).
#[derive(Debug)]
pub struct Cell {
    data: Vec<u8>,
    used: usize,
    status: CellStatus,
}

impl Cell {
    /// Allocate a new, empty, `Free` cell with the given capacity.
    ///
    /// # Panics
    ///
    /// Aborts the process on allocation failure, via the standard global
    /// allocator's default handler — the spec treats init-time allocation
    /// failure as fatal (§7). Use [`Cell::try_new`] to handle it instead.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            used: 0,
            status: CellStatus::Free,
        }
    }

    /// Fallible allocation, used by [`crate::ring::BufferRing::try_new`] so
    /// sink construction can surface `SinkError::Alloc` instead of
    /// aborting.
    pub fn try_new(capacity: usize) -> io::Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        data.resize(capacity, 0u8);
        Ok(Self {
            data,
            used: 0,
            status: CellStatus::Free,
        })
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes still free for appending.
    pub fn avail(&self) -> usize {
        self.capacity() - self.used
    }

    /// Whether the cell currently holds no valid bytes.
    pub fn empty(&self) -> bool {
        self.used == 0
    }

    /// The valid `[0, used)` prefix. Only meaningful to read while the
    /// cell is `Full`, which is what grants the persister exclusive
    /// access to it.
    pub fn used_bytes(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Current status.
    pub fn status(&self) -> CellStatus {
        self.status
    }

    /// Set the status. Always called under the ring's mutex.
    pub fn set_status(&mut self, status: CellStatus) {
        self.status = status;
    }

    /// Append `bytes` at the current `used` offset and advance `used`.
    /// No-op if `bytes.len() > self.avail()` — callers must verify
    /// capacity first (spec: "Callers must verify capacity before calling").
    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.len() > self.avail() {
            return;
        }
        let start = self.used;
        let end = start + bytes.len();
        self.data[start..end].copy_from_slice(bytes);
        self.used = end;
    }

    /// Write the first `used` bytes to `sink`. Does not modify `used` —
    /// clearing is a distinct step so a short write can still be observed
    /// before the buffer is released back to producers.
    pub fn persist<W: Write>(&self, sink: &mut W) -> io::Result<usize> {
        sink.write(&self.data[..self.used])
    }

    /// Reset `used` to zero and mark the cell `Free` for reuse.
    pub fn clear(&mut self) {
        self.used = 0;
        self.status = CellStatus::Free;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_respects_capacity() {
        let mut cell = Cell::new(8);
        cell.append(b"12345");
        assert_eq!(cell.avail(), 3);
        cell.append(b"abcd"); // would overflow, no-op
        assert_eq!(cell.avail(), 3);
        assert!(cell.data[..5] == *b"12345");
    }

    #[test]
    fn persist_writes_used_prefix_only() {
        let mut cell = Cell::new(16);
        cell.append(b"hello\n");
        let mut out = Vec::new();
        let n = cell.persist(&mut out).unwrap();
        assert_eq!(n, 6);
        assert_eq!(out, b"hello\n");
    }

    #[test]
    fn clear_resets_used_and_status() {
        let mut cell = Cell::new(16);
        cell.append(b"x");
        cell.set_status(CellStatus::Full);
        cell.clear();
        assert!(cell.empty());
        assert_eq!(cell.status(), CellStatus::Free);
    }
}
