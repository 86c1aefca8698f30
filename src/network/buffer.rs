//! Connection Buffer
//!
//! Accumulates arbitrarily chunked bytes and hands back complete lines.

use bytes::{Bytes, BytesMut};

const LINE_TERMINATOR: u8 = b'\n';

/// Inbound byte accumulator for one connection
///
/// Holds everything received but not yet returned as a line. A line is
/// every byte up to and including `\n`; anything after the last terminator
/// stays buffered until more data arrives.
#[derive(Debug, Default)]
pub struct ConnectionBuffer {
    buf: BytesMut,

    /// Prefix of `buf` already known to contain no terminator
    scanned: usize,

    /// Bytes after the last terminator seen so far
    partial: usize,
}

impl ConnectionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Append a received chunk
    pub fn extend(&mut self, chunk: &[u8]) {
        self.partial = match chunk.iter().rposition(|&b| b == LINE_TERMINATOR) {
            Some(pos) => chunk.len() - pos - 1,
            None => self.partial + chunk.len(),
        };
        self.buf.extend_from_slice(chunk);
    }

    /// Append a chunk and iterate over the lines it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.extend(chunk);
        self.lines()
    }

    /// Remove and return the next complete line, terminator included
    pub fn next_line(&mut self) -> Option<Bytes> {
        match self.buf[self.scanned..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR)
        {
            Some(offset) => {
                let end = self.scanned + offset + 1;
                self.scanned = 0;
                Some(self.buf.split_to(end).freeze())
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Lazily drain every complete line currently buffered
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { buffer: self }
    }

    /// Total buffered bytes, complete lines included
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes of the trailing, not yet terminated line
    pub fn partial_len(&self) -> usize {
        self.partial
    }

    /// Everything still buffered
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.scanned = 0;
        self.partial = 0;
    }
}

/// Iterator over the complete lines of a [`ConnectionBuffer`]
pub struct Lines<'a> {
    buffer: &'a mut ConnectionBuffer,
}

impl Iterator for Lines<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.next_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_resumes_where_it_stopped() {
        let mut buffer = ConnectionBuffer::new();

        assert!(buffer.feed(b"SET key ").next().is_none());
        assert_eq!(buffer.scanned, 8);

        let line = buffer.feed(b"value\r\n").next().unwrap();
        assert_eq!(&line[..], b"SET key value\r\n");
        assert_eq!(buffer.scanned, 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_tracks_tail_after_last_terminator() {
        let mut buffer = ConnectionBuffer::new();

        buffer.extend(b"abc");
        assert_eq!(buffer.partial_len(), 3);

        buffer.extend(b"d\nPING\r\nGE");
        assert_eq!(buffer.partial_len(), 2);
        assert_eq!(buffer.len(), 13);

        buffer.clear();
        assert_eq!(buffer.partial_len(), 0);
    }
}
