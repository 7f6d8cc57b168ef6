use std::time::{Duration, Instant};

use tracing::trace;

/// Explicit debounce timer owned by an input boundary. Every keystroke
/// replaces the pending value and pushes the deadline out; only the last
/// value within a quiet window is ever delivered. Timers are reset, never
/// accumulated.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    deadline: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Debouncer { quiet, deadline: None, pending: None }
    }

    /// Record a new input, cancelling and rescheduling any pending delivery.
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.quiet);
    }

    /// Deliver the pending value once the quiet window has elapsed. Called
    /// from the event loop tick.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                trace!("Debounce window elapsed");
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The instant the pending delivery is due, for event-loop timeout
    /// calculation.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
