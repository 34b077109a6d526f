//! Collaborator interfaces for one request/response exchange.
//!
//! # Responsibilities
//! - Define the seams between the connection driver and protocol logic
//! - Header parsing: incremental scan of the request head
//! - Body framing: declared-length (or terminator) body assembly
//! - Dispatch: turn a parsed request into response buffers
//!
//! The driver knows nothing about the wire protocol beyond these traits;
//! `http1` provides a minimal reference implementation for the demo binary
//! and the integration tests.

pub mod http1;

use bytes::Bytes;

use crate::connection::WriteQueue;

/// Outcome of feeding buffered bytes to a parsing collaborator.
#[derive(Debug)]
pub enum FeedOutcome<T> {
    /// Everything seen so far is a valid prefix; more input is required.
    /// No bytes are consumed: the driver re-feeds the full unconsumed
    /// region once more data arrives.
    NeedMore,
    /// The element terminated after `consumed` bytes. Bytes beyond
    /// `consumed` belong to the next phase (body, or a pipelined request).
    Complete { value: T, consumed: usize },
    /// The input violates the protocol. The optional bytes are a pre-close
    /// reply (e.g. a 400 status line) written best-effort before teardown.
    Malformed(Option<Bytes>),
}

/// Incremental parser for the request head.
pub trait HeaderParser: Send {
    type Request: Send;

    /// Feed the full unconsumed buffer region. Called after every read
    /// completion in the header phase.
    fn feed(&mut self, bytes: &[u8]) -> FeedOutcome<Self::Request>;

    /// Restore initial state for the next request on a kept-alive connection.
    fn reset(&mut self);
}

/// Incremental framer for the request body.
pub trait BodyFraming: Send {
    type Request: Send;
    type Body: Send;

    /// Inspect a completed head and prepare for its body.
    /// Returns `false` when the request carries no body at all.
    fn begin(&mut self, request: &Self::Request) -> bool;

    /// Feed the full unconsumed buffer region. Called after `begin`
    /// returned `true`, once per read completion in the body phase.
    fn feed(&mut self, bytes: &[u8]) -> FeedOutcome<Self::Body>;

    /// Restore initial state for the next request on a kept-alive connection.
    fn reset(&mut self);
}

/// Response produced by the dispatch collaborator.
#[derive(Debug)]
pub struct Reply {
    /// Ordered response byte ranges, written as one logical operation.
    pub buffers: WriteQueue,
    /// Whether the connection may be reused for another exchange.
    pub keep_alive: bool,
}

/// Application dispatch: turns a parsed request into a reply.
///
/// May be genuinely asynchronous; the connection driver suspends at the
/// response phase until the returned future resolves.
pub trait Dispatch: Send {
    type Request: Send;
    type Body: Send;

    fn handle(
        &mut self,
        request: Self::Request,
        body: Option<Self::Body>,
    ) -> impl std::future::Future<Output = Reply> + Send;
}
