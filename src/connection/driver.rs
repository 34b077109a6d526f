//! Connection state machine.
//!
//! # Responsibilities
//! - Sequence one accepted transport through its exchange phases
//! - Arm a single deadline per phase and force close on expiry
//! - Feed buffered bytes to the parsing/framing collaborators
//! - Hand parsed requests to dispatch and write its reply
//! - Tear down exactly once, whatever path got us there
//!
//! Each driver runs on its own task; that task is the connection's strand.
//! At most one read, one write and one armed deadline exist at a time, so
//! no locking is needed within a connection, and the timer/I/O race is
//! settled by `select!` dropping the losing future.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{ExchangeLimits, ExchangeTimeouts};
use crate::connection::{ConnectionId, Deadline, ReadBuffer, Registry};
use crate::exchange::{BodyFraming, Dispatch, FeedOutcome, HeaderParser, Reply};
use crate::net::{ReadOutcome, Transport};
use crate::observability::metrics;

/// Phase of the request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingRequestHeaders,
    AwaitingRequestBody,
    SendingResponse,
    Closed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingRequestHeaders => "header read",
            Phase::AwaitingRequestBody => "body read",
            Phase::SendingResponse => "response write",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why a connection ended. Every variant is local to one connection;
/// none are fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("{0} timed out")]
    TimedOut(Phase),
    #[error("malformed request")]
    Malformed,
    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// Drives one connection from accept to close.
pub struct ConnectionDriver<T, H, B, D>
where
    H: HeaderParser,
    B: BodyFraming<Request = H::Request>,
    D: Dispatch<Request = H::Request, Body = B::Body>,
{
    id: ConnectionId,
    transport: Transport<T>,
    buffer: ReadBuffer,
    deadline: Deadline,
    phase: Phase,
    parser: H,
    framer: B,
    dispatch: D,
    registry: Arc<dyn Registry>,
    timeouts: ExchangeTimeouts,
    limits: ExchangeLimits,
    served: u64,
    closed: bool,
}

impl<T, H, B, D> ConnectionDriver<T, H, B, D>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
    H: HeaderParser,
    B: BodyFraming<Request = H::Request>,
    D: Dispatch<Request = H::Request, Body = B::Body>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ConnectionId,
        io: T,
        parser: H,
        framer: B,
        dispatch: D,
        registry: Arc<dyn Registry>,
        timeouts: ExchangeTimeouts,
        limits: ExchangeLimits,
    ) -> Self {
        Self {
            id,
            transport: Transport::new(io),
            buffer: ReadBuffer::new(),
            deadline: Deadline::new(),
            phase: Phase::Idle,
            parser,
            framer,
            dispatch,
            registry,
            timeouts,
            limits,
            served: 0,
            closed: false,
        }
    }

    /// Entry point, invoked once per accepted transport. Runs the exchange
    /// loop to completion and tears the connection down on every path.
    pub async fn begin(mut self) -> Result<(), ConnectionError> {
        let result = self.drive().await;

        match &result {
            Ok(()) => {
                tracing::debug!(connection_id = %self.id, served = self.served, "Exchange finished");
            }
            Err(ConnectionError::PeerClosed) => {
                tracing::debug!(connection_id = %self.id, "Peer closed the connection");
            }
            Err(ConnectionError::TimedOut(phase)) => {
                tracing::warn!(connection_id = %self.id, phase = %phase, "Phase timed out");
                metrics::record_timeout(*phase);
            }
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "Connection failed");
                metrics::record_connection_error();
            }
        }

        self.close().await;
        result
    }

    /// The exchange loop: header read, optional body read, dispatch,
    /// response write, then either keep-alive reuse or return.
    async fn drive(&mut self) -> Result<(), ConnectionError> {
        loop {
            // Surplus from a previous exchange stays; its consumed prefix goes.
            self.buffer.drain_consumed();

            self.enter(Phase::AwaitingRequestHeaders);
            // One deadline spans every read of the header phase, so a peer
            // trickling bytes cannot hold the connection open indefinitely.
            self.deadline.arm(self.timeouts.header_read());
            let request = self.read_head().await?;
            self.deadline.cancel();

            let body = if self.framer.begin(&request) {
                self.enter(Phase::AwaitingRequestBody);
                self.deadline.arm(self.timeouts.body_read());
                let body = self.read_body().await?;
                self.deadline.cancel();
                Some(body)
            } else {
                None
            };

            // Dispatch may be genuinely asynchronous; no deadline is armed
            // while the application is thinking.
            self.enter(Phase::SendingResponse);
            let Reply {
                mut buffers,
                keep_alive,
            } = self.dispatch.handle(request, body).await;

            self.deadline.arm(self.timeouts.write());
            self.write_guarded(buffers.take()).await?;
            self.deadline.cancel();

            self.served += 1;
            metrics::record_request_served();

            if !keep_alive || self.served >= self.limits.max_requests_per_connection {
                return Ok(());
            }

            self.parser.reset();
            self.framer.reset();
            tracing::trace!(connection_id = %self.id, served = self.served, "Connection kept alive");
        }
    }

    /// Read until the header-parsing collaborator reports a complete head.
    async fn read_head(&mut self) -> Result<H::Request, ConnectionError> {
        loop {
            if self.buffer.unconsumed_len() > 0 {
                match self.parser.feed(self.buffer.unconsumed()) {
                    FeedOutcome::Complete { value, consumed } => {
                        self.buffer.consume(consumed);
                        return Ok(value);
                    }
                    FeedOutcome::Malformed(reject) => return Err(self.reject(reject).await),
                    FeedOutcome::NeedMore => {
                        // Same boundary as the body cap: exactly at the
                        // limit is still allowed.
                        if self.buffer.unconsumed_len() > self.limits.max_head_bytes {
                            return Err(ConnectionError::HeadTooLarge {
                                limit: self.limits.max_head_bytes,
                            });
                        }
                    }
                }
            }
            self.read_more().await?;
        }
    }

    /// Read until the body-framing collaborator reports a complete body.
    async fn read_body(&mut self) -> Result<B::Body, ConnectionError> {
        loop {
            if self.buffer.unconsumed_len() > 0 {
                match self.framer.feed(self.buffer.unconsumed()) {
                    FeedOutcome::Complete { value, consumed } => {
                        self.buffer.consume(consumed);
                        return Ok(value);
                    }
                    FeedOutcome::Malformed(reject) => return Err(self.reject(reject).await),
                    FeedOutcome::NeedMore => {
                        if self.buffer.unconsumed_len() > self.limits.max_body_bytes {
                            return Err(ConnectionError::BodyTooLarge {
                                limit: self.limits.max_body_bytes,
                            });
                        }
                    }
                }
            }
            self.read_more().await?;
        }
    }

    /// One read completion, raced against the current phase deadline.
    /// A zero-byte completion is graceful peer close, never an empty request.
    async fn read_more(&mut self) -> Result<usize, ConnectionError> {
        tokio::select! {
            outcome = self.transport.read_some(self.buffer.write_target()) => {
                match outcome? {
                    ReadOutcome::Data(n) => Ok(n),
                    ReadOutcome::Eof => Err(ConnectionError::PeerClosed),
                }
            }
            _ = self.deadline.expired() => Err(ConnectionError::TimedOut(self.phase)),
        }
    }

    /// Write every queued range, raced against the current phase deadline.
    async fn write_guarded(&mut self, chunks: Vec<Bytes>) -> Result<(), ConnectionError> {
        tokio::select! {
            result = self.transport.write_all(chunks) => {
                result.map_err(ConnectionError::Transport)
            }
            _ = self.deadline.expired() => Err(ConnectionError::TimedOut(self.phase)),
        }
    }

    /// Malformed input: the collaborator decides what, if anything, goes
    /// back to the peer before closure. The write is best-effort under the
    /// write deadline; its outcome does not change the verdict.
    async fn reject(&mut self, reply: Option<Bytes>) -> ConnectionError {
        if let Some(bytes) = reply {
            // The reply is a write like any other; a timeout here must
            // carry the write phase, not the read phase we came from.
            self.enter(Phase::SendingResponse);
            self.deadline.arm(self.timeouts.write());
            if let Err(e) = self.write_guarded(vec![bytes]).await {
                tracing::debug!(connection_id = %self.id, error = %e, "Reject reply not delivered");
            }
            self.deadline.cancel();
        }
        ConnectionError::Malformed
    }

    fn enter(&mut self, phase: Phase) {
        tracing::trace!(
            connection_id = %self.id,
            from = %self.phase,
            to = %phase,
            generation = self.deadline.generation(),
            "Phase transition"
        );
        self.phase = phase;
    }

    /// Idempotent teardown: cancel the deadline, shut the transport down,
    /// notify the registry once. Closing the transport is also what cancels
    /// any read the peer still believes is in flight.
    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.deadline.cancel();
        self.enter(Phase::Closed);
        self.transport.shutdown_and_close().await;
        self.registry.on_closed(self.id);
        metrics::record_connection_closed();
    }
}
