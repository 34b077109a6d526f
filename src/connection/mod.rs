//! Per-connection state machine and its supporting pieces.

pub mod buffer;
pub mod deadline;
pub mod driver;
pub mod tracker;

pub use buffer::{ReadBuffer, WriteQueue};
pub use deadline::Deadline;
pub use driver::{ConnectionDriver, ConnectionError, Phase};
pub use tracker::{ConnectionGuard, ConnectionId, ConnectionTracker, Registry};
