//! Scroll throttle: at most one evaluation per interval.
//!
//! Leading edge fires immediately; scrolls that arrive inside the interval
//! are coalesced into a single trailing evaluation that the host's tick
//! flushes once the interval has elapsed. Time is always passed in.

use std::time::{Duration, Instant};

/// Rate limiter for scroll evaluations.
#[derive(Debug, Clone)]
pub struct ScrollThrottle {
    interval: Duration,
    last_fired: Option<Instant>,
    trailing: bool,
}

impl ScrollThrottle {
    /// Throttle admitting one evaluation per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            trailing: false,
        }
    }

    /// Minimum time between evaluations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a scroll event. Returns true if it should be evaluated now.
    pub fn admit(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.fire(now);
            true
        } else {
            self.trailing = true;
            false
        }
    }

    /// Release a coalesced trailing evaluation once the interval elapsed.
    pub fn flush(&mut self, now: Instant) -> bool {
        if self.trailing && self.ready(now) {
            self.fire(now);
            true
        } else {
            false
        }
    }

    /// True while a trailing evaluation is waiting.
    pub fn is_pending(&self) -> bool {
        self.trailing
    }

    fn ready(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    fn fire(&mut self, now: Instant) {
        self.last_fired = Some(now);
        self.trailing = false;
    }
}
