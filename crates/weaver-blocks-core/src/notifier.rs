//! Debounced change notification.
//!
//! A block turns bursts of DOM mutations into a single "data changed" event.
//! [`ChangeNotifier`] owns the pending deadline; the platform layer decides
//! when to [`poll`](ChangeNotifier::poll) it (a browser timeout, a test clock).

use std::time::Duration;

use web_time::Instant;

/// Quiet period after the last mutation before a change is reported.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(450);

/// Debounce timer state: idle, or pending until a deadline.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ChangeNotifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer, or restart it if already pending.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop a pending notification. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
