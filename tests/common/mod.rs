//! Shared utilities for the lifecycle and end-to-end tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, DuplexStream};
use tokio::task::JoinHandle;

use exchange_core::config::{ExchangeLimits, ExchangeTimeouts};
use exchange_core::connection::{ConnectionDriver, ConnectionError, ConnectionId, Registry};
use exchange_core::exchange::http1::{
    simple_response, ContentLengthFraming, Http1HeadParser, RequestHead,
};
use exchange_core::exchange::{Dispatch, Reply};

/// Registry that counts closed notifications.
#[derive(Default)]
pub struct CountingRegistry {
    closed: AtomicUsize,
}

impl CountingRegistry {
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Registry for CountingRegistry {
    fn on_closed(&self, _id: ConnectionId) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Dispatch that counts handled requests and answers with a fixed body.
/// Honors the keep-alive wish carried in the request head.
pub struct CountingDispatch {
    handled: Arc<AtomicUsize>,
    delay: Option<Duration>,
    body: &'static [u8],
}

impl CountingDispatch {
    pub fn new(handled: Arc<AtomicUsize>) -> Self {
        Self {
            handled,
            delay: None,
            body: b"ok",
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_body(mut self, body: &'static [u8]) -> Self {
        self.body = body;
        self
    }
}

impl Dispatch for CountingDispatch {
    type Request = RequestHead;
    type Body = Bytes;

    async fn handle(&mut self, request: RequestHead, body: Option<Bytes>) -> Reply {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.handled.fetch_add(1, Ordering::SeqCst);
        let _ = body;
        Reply {
            buffers: simple_response("HTTP/1.1 200 OK", Bytes::from_static(self.body)),
            keep_alive: request.keep_alive,
        }
    }
}

/// Timeouts short enough for tests but long enough to stay off the flaky edge.
pub fn test_timeouts() -> ExchangeTimeouts {
    ExchangeTimeouts {
        header_read_ms: 200,
        body_read_ms: 200,
        write_ms: 200,
    }
}

pub fn test_limits() -> ExchangeLimits {
    ExchangeLimits {
        max_head_bytes: 4096,
        max_body_bytes: 64 * 1024,
        max_requests_per_connection: 100,
    }
}

pub struct DriverHarness {
    pub client: DuplexStream,
    pub task: JoinHandle<Result<(), ConnectionError>>,
    pub registry: Arc<CountingRegistry>,
    pub handled: Arc<AtomicUsize>,
}

/// Spin up a driver over an in-memory pipe with the HTTP/1.x reference
/// collaborators and a counting dispatch.
pub fn spawn_driver(
    timeouts: ExchangeTimeouts,
    limits: ExchangeLimits,
    configure: impl FnOnce(CountingDispatch) -> CountingDispatch,
) -> DriverHarness {
    spawn_driver_with_pipe(timeouts, limits, 64 * 1024, configure)
}

/// Same as `spawn_driver`, with control over the pipe capacity (small
/// capacities stall writes, which is how the write-timeout test works).
pub fn spawn_driver_with_pipe(
    timeouts: ExchangeTimeouts,
    limits: ExchangeLimits,
    pipe_capacity: usize,
    configure: impl FnOnce(CountingDispatch) -> CountingDispatch,
) -> DriverHarness {
    let (client, server) = tokio::io::duplex(pipe_capacity);
    let registry = Arc::new(CountingRegistry::default());
    let handled = Arc::new(AtomicUsize::new(0));

    let dispatch = configure(CountingDispatch::new(Arc::clone(&handled)));
    let driver = ConnectionDriver::new(
        ConnectionId::new(),
        server,
        Http1HeadParser::new(),
        ContentLengthFraming::default(),
        dispatch,
        registry.clone() as Arc<dyn Registry>,
        timeouts,
        limits,
    );

    let task = tokio::spawn(driver.begin());
    DriverHarness {
        client,
        task,
        registry,
        handled,
    }
}

/// Read one HTTP response (head + content-length body) off a stream.
pub async fn read_response<S: AsyncReadExt + Unpin>(stream: &mut S) -> Vec<u8> {
    let mut data = Vec::new();
    let mut byte = [0u8; 1];
    // Head first.
    while !data.ends_with(b"\r\n\r\n") {
        let n = stream.read(&mut byte).await.unwrap();
        if n == 0 {
            return data;
        }
        data.extend_from_slice(&byte);
    }
    // Then the declared body.
    let head = String::from_utf8_lossy(&data).to_string();
    let body_len = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    let mut body = vec![0u8; body_len];
    stream.read_exact(&mut body).await.unwrap();
    data.extend_from_slice(&body);
    data
}
