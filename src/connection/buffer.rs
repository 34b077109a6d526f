//! Read buffer and scatter-gather write queue.
//!
//! # Responsibilities
//! - Accumulate inbound bytes and track how much collaborators consumed
//! - Hold outbound byte ranges without an intermediate copy
//!
//! A buffer belongs to exactly one in-flight operation at a time; the
//! driver never issues a read while a collaborator still holds a slice.

use bytes::{Buf, Bytes, BytesMut};

/// How much extra capacity a single read reserves.
const READ_CHUNK: usize = 8 * 1024;

/// Growable inbound buffer with a consumed cursor.
///
/// Reads append to the tail; collaborators are fed the unconsumed region
/// and report how much of it they claimed.
#[derive(Debug, Default)]
pub struct ReadBuffer {
    data: BytesMut,
    consumed: usize,
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self {
            data: BytesMut::with_capacity(READ_CHUNK),
            consumed: 0,
        }
    }

    /// The region collaborators have not yet claimed.
    pub fn unconsumed(&self) -> &[u8] {
        &self.data[self.consumed..]
    }

    pub fn unconsumed_len(&self) -> usize {
        self.data.len() - self.consumed
    }

    /// Mark `n` unconsumed bytes as claimed by a collaborator.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.consumed + n <= self.data.len());
        self.consumed += n;
    }

    /// Drop the consumed prefix so a kept-alive connection does not
    /// accumulate previous exchanges.
    pub fn drain_consumed(&mut self) {
        if self.consumed > 0 {
            self.data.advance(self.consumed);
            self.consumed = 0;
        }
    }

    /// Mutable tail for the transport to append into. Reserves one read
    /// chunk of spare capacity.
    pub fn write_target(&mut self) -> &mut BytesMut {
        self.data.reserve(READ_CHUNK);
        &mut self.data
    }
}

/// Ordered list of outbound byte ranges for a single write operation.
///
/// The ranges stay separate (no concatenation); the transport walks them
/// in order until all bytes are on the wire.
#[derive(Debug, Default)]
pub struct WriteQueue {
    chunks: Vec<Bytes>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn push(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// Hand the ranges to the transport, leaving the queue empty.
    pub fn take(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.chunks)
    }
}

impl From<Bytes> for WriteQueue {
    fn from(chunk: Bytes) -> Self {
        let mut q = WriteQueue::new();
        q.push(chunk);
        q
    }
}

impl FromIterator<Bytes> for WriteQueue {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut q = WriteQueue::new();
        for chunk in iter {
            q.push(chunk);
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_and_drain() {
        let mut buf = ReadBuffer::new();
        buf.write_target().extend_from_slice(b"GET / HTTP/1.0\r\n\r\nleft");
        assert_eq!(buf.unconsumed_len(), 22);

        buf.consume(18);
        assert_eq!(buf.unconsumed(), b"left");

        buf.drain_consumed();
        assert_eq!(buf.unconsumed(), b"left");
        assert_eq!(buf.unconsumed_len(), 4);
    }

    #[test]
    fn write_queue_preserves_order_and_drops_empty() {
        let mut q = WriteQueue::new();
        q.push(Bytes::from_static(b"HTTP/1.0 200 OK\r\n\r\n"));
        q.push(Bytes::new());
        q.push(Bytes::from_static(b"hello"));

        assert_eq!(q.total_len(), 24);
        let chunks = q.take();
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[1][..], b"hello");
        assert!(q.is_empty());
    }
}
