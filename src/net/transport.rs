//! Transport channel over any byte stream.
//!
//! # Responsibilities
//! - Non-blocking reads into the connection's buffer
//! - All-or-nothing writes of a scatter list
//! - Idempotent half-close + close
//!
//! The wrapper is generic over `AsyncRead + AsyncWrite`, so an encrypted
//! stream plugs into the same seam as a plain `TcpStream`; the connection
//! driver never names a concrete socket type.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Outcome of a single read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n > 0` bytes were appended to the buffer.
    Data(usize),
    /// The peer closed its sending side; nothing was appended.
    Eof,
}

/// A server-side transport channel.
///
/// Errors (reset, broken pipe) come back through the same `Result` as
/// data; callers branch on the outcome, nothing unwinds across this
/// boundary.
#[derive(Debug)]
pub struct Transport<T> {
    io: T,
    closed: bool,
}

impl<T: AsyncRead + AsyncWrite + Unpin> Transport<T> {
    pub fn new(io: T) -> Self {
        Self { io, closed: false }
    }

    /// Read whatever is available into `buf`.
    ///
    /// Must not be called while another read on this channel is pending;
    /// the driver's strand guarantees that. A zero-byte completion is
    /// reported as `Eof`, never as `Data(0)`.
    pub async fn read_some(&mut self, buf: &mut BytesMut) -> std::io::Result<ReadOutcome> {
        let n = self.io.read_buf(buf).await?;
        if n == 0 {
            Ok(ReadOutcome::Eof)
        } else {
            Ok(ReadOutcome::Data(n))
        }
    }

    /// Write every queued range, in order, to completion.
    ///
    /// Partial progress is never surfaced: the operation ends in full
    /// success or the first error.
    pub async fn write_all(&mut self, chunks: Vec<bytes::Bytes>) -> std::io::Result<()> {
        for chunk in chunks {
            self.io.write_all(&chunk).await?;
        }
        self.io.flush().await
    }

    /// Best-effort half-close followed by close. Idempotent; shutdown
    /// errors are traced and swallowed since the connection is being
    /// discarded regardless.
    pub async fn shutdown_and_close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.io.shutdown().await {
            tracing::debug!(error = %e, "Transport shutdown failed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
