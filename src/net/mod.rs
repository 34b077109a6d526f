//! Network layer: bounded accept loop and the transport channel.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → transport.rs (read/write/shutdown channel)
//!     → connection::driver (exchange state machine)
//! ```
//!
//! # Design Decisions
//! - Bounded accept via semaphore prevents resource exhaustion
//! - The transport is generic over the byte stream, so an encrypted
//!   stream plugs in without the driver knowing

pub mod listener;
pub mod transport;

pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use transport::{ReadOutcome, Transport};
