//! Single-shot phase deadline.
//!
//! # Responsibilities
//! - Guard the current exchange phase with at most one armed deadline
//! - Replace the previous deadline on re-arm, no-op on repeated cancel
//!
//! The driver awaits `expired()` in the same `select!` as the guarded I/O,
//! so exactly one of the two completes and the loser is simply dropped;
//! there is no cross-callback race to arbitrate. The generation count
//! records which phase armed the deadline and shows up in trace output.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Sleep};

/// One deadline per connection, re-armed at phase transitions.
#[derive(Debug, Default)]
pub struct Deadline {
    sleep: Option<Pin<Box<Sleep>>>,
    generation: u64,
}

impl Deadline {
    pub fn new() -> Self {
        Self {
            sleep: None,
            generation: 0,
        }
    }

    /// Arm a fresh deadline, implicitly cancelling any previous one.
    /// Returns the generation the deadline belongs to.
    pub fn arm(&mut self, after: Duration) -> u64 {
        self.generation += 1;
        self.sleep = Some(Box::pin(sleep(after)));
        self.generation
    }

    /// Disarm. Safe to call when nothing is armed or after expiry.
    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Generation of the most recently armed deadline.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves when the armed deadline fires; never resolves while
    /// disarmed. The deadline stays spent until the next `arm`.
    pub async fn expired(&mut self) {
        match self.sleep.as_mut() {
            Some(s) => {
                s.as_mut().await;
                self.sleep = None;
            }
            None => pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fires_once_armed() {
        let mut d = Deadline::new();
        d.arm(Duration::from_millis(10));
        assert!(d.is_armed());
        d.expired().await;
        assert!(!d.is_armed());
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let mut d = Deadline::new();
        d.arm(Duration::from_millis(10));
        d.cancel();
        d.cancel();
        assert!(!d.is_armed());

        // Never resolves while disarmed.
        let waited = tokio::time::timeout(Duration::from_millis(30), d.expired()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn rearm_replaces_previous() {
        let mut d = Deadline::new();
        let g1 = d.arm(Duration::from_secs(60));
        let g2 = d.arm(Duration::from_millis(10));
        assert!(g2 > g1);

        // The long deadline was replaced; the short one fires promptly.
        tokio::time::timeout(Duration::from_millis(200), d.expired())
            .await
            .expect("replacement deadline should fire");
    }
}
