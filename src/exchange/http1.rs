//! Minimal HTTP/1.x reference collaborators.
//!
//! Just enough protocol to exercise the connection core end to end:
//! a head scanner (request line, `Content-Length`, `Connection`) and a
//! declared-length body framer. Chunked transfer, continuation lines and
//! the rest of HTTP live outside this crate.

use bytes::Bytes;

use crate::connection::WriteQueue;
use crate::exchange::{BodyFraming, FeedOutcome, HeaderParser};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\nconnection: close\r\n\r\n";

/// A parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub version: String,
    pub content_length: usize,
    /// What the peer asked for; dispatch still has the final say.
    pub keep_alive: bool,
}

/// Scans for the head terminator and parses the request line plus the
/// two headers the core cares about.
///
/// Stateless across feeds: the driver re-feeds the full unconsumed
/// region until the terminator shows up.
#[derive(Debug, Default)]
pub struct Http1HeadParser;

impl Http1HeadParser {
    pub fn new() -> Self {
        Self
    }

    fn parse(head: &[u8]) -> Option<RequestHead> {
        let text = std::str::from_utf8(head).ok()?;
        let mut lines = text.split("\r\n");

        let request_line = lines.next()?;
        let mut parts = request_line.split_ascii_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?.to_string();
        let version = parts.next()?.to_string();
        if parts.next().is_some() || method.is_empty() {
            return None;
        }

        let mut content_length = 0usize;
        let mut connection = None;
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line.split_once(':')?;
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().ok()?;
            } else if name.eq_ignore_ascii_case("connection") {
                connection = Some(value.to_ascii_lowercase());
            }
        }

        let keep_alive = match connection.as_deref() {
            Some("close") => false,
            Some("keep-alive") => true,
            _ => version == "HTTP/1.1",
        };

        Some(RequestHead {
            method,
            target,
            version,
            content_length,
            keep_alive,
        })
    }
}

impl HeaderParser for Http1HeadParser {
    type Request = RequestHead;

    fn feed(&mut self, bytes: &[u8]) -> FeedOutcome<RequestHead> {
        let Some(end) = find_terminator(bytes) else {
            return FeedOutcome::NeedMore;
        };
        let consumed = end + HEAD_TERMINATOR.len();

        match Self::parse(&bytes[..end]) {
            Some(head) => FeedOutcome::Complete {
                value: head,
                consumed,
            },
            None => FeedOutcome::Malformed(Some(Bytes::from_static(BAD_REQUEST))),
        }
    }

    fn reset(&mut self) {}
}

fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}

/// Declared-length body framer.
#[derive(Debug, Default)]
pub struct ContentLengthFraming {
    expected: usize,
}

impl BodyFraming for ContentLengthFraming {
    type Request = RequestHead;
    type Body = Bytes;

    fn begin(&mut self, request: &RequestHead) -> bool {
        self.expected = request.content_length;
        self.expected > 0
    }

    fn feed(&mut self, bytes: &[u8]) -> FeedOutcome<Bytes> {
        if bytes.len() >= self.expected {
            FeedOutcome::Complete {
                value: Bytes::copy_from_slice(&bytes[..self.expected]),
                consumed: self.expected,
            }
        } else {
            FeedOutcome::NeedMore
        }
    }

    fn reset(&mut self) {
        self.expected = 0;
    }
}

/// Assemble a response as a scatter list: head range + optional body range.
pub fn simple_response(status_line: &str, body: Bytes) -> WriteQueue {
    let head = format!(
        "{}\r\ncontent-length: {}\r\n\r\n",
        status_line,
        body.len()
    );
    let mut queue = WriteQueue::new();
    queue.push(Bytes::from(head));
    queue.push(body);
    queue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_head() {
        let mut parser = Http1HeadParser::new();
        let input = b"GET /index HTTP/1.1\r\nhost: example\r\ncontent-length: 5\r\n\r\nhello";
        match parser.feed(input) {
            FeedOutcome::Complete { value, consumed } => {
                assert_eq!(value.method, "GET");
                assert_eq!(value.target, "/index");
                assert_eq!(value.content_length, 5);
                assert!(value.keep_alive);
                // "hello" stays for the body framer.
                assert_eq!(consumed, input.len() - 5);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn needs_more_until_terminator() {
        let mut parser = Http1HeadParser::new();
        assert!(matches!(
            parser.feed(b"GET / HTTP/1.1\r\nhost: e"),
            FeedOutcome::NeedMore
        ));
        // Terminator split across reads works because the driver re-feeds
        // the whole region.
        assert!(matches!(
            parser.feed(b"GET / HTTP/1.1\r\n\r"),
            FeedOutcome::NeedMore
        ));
        assert!(matches!(
            parser.feed(b"GET / HTTP/1.1\r\n\r\n"),
            FeedOutcome::Complete { .. }
        ));
    }

    #[test]
    fn malformed_request_line_is_rejected() {
        let mut parser = Http1HeadParser::new();
        match parser.feed(b"NOT A REQUEST LINE AT ALL\r\n\r\n") {
            FeedOutcome::Malformed(reply) => {
                let reply = reply.expect("reject reply");
                assert!(reply.starts_with(b"HTTP/1.1 400"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn connection_close_disables_keep_alive() {
        let mut parser = Http1HeadParser::new();
        let FeedOutcome::Complete { value, .. } =
            parser.feed(b"GET / HTTP/1.1\r\nconnection: close\r\n\r\n")
        else {
            panic!("head should parse");
        };
        assert!(!value.keep_alive);
    }

    #[test]
    fn http10_defaults_to_close() {
        let mut parser = Http1HeadParser::new();
        let FeedOutcome::Complete { value, .. } = parser.feed(b"GET / HTTP/1.0\r\n\r\n") else {
            panic!("head should parse");
        };
        assert!(!value.keep_alive);
    }

    #[test]
    fn framer_waits_for_declared_length() {
        let head = RequestHead {
            method: "POST".into(),
            target: "/".into(),
            version: "HTTP/1.1".into(),
            content_length: 8,
            keep_alive: true,
        };
        let mut framer = ContentLengthFraming::default();
        assert!(framer.begin(&head));

        assert!(matches!(framer.feed(b"abc"), FeedOutcome::NeedMore));
        match framer.feed(b"abcdefghEXTRA") {
            FeedOutcome::Complete { value, consumed } => {
                assert_eq!(&value[..], b"abcdefgh");
                assert_eq!(consumed, 8);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn bodyless_request_skips_framing() {
        let head = RequestHead {
            method: "GET".into(),
            target: "/".into(),
            version: "HTTP/1.1".into(),
            content_length: 0,
            keep_alive: true,
        };
        let mut framer = ContentLengthFraming::default();
        assert!(!framer.begin(&head));
    }

    #[test]
    fn simple_response_is_two_ranges() {
        let queue = simple_response("HTTP/1.1 200 OK", Bytes::from_static(b"hi"));
        assert_eq!(queue.total_len(), "HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\n".len() + 2);
    }
}
