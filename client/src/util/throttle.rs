//! Leading-edge throttle for scroll events.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use std::time::Duration;

use tokio::time::Instant;

/// Lets one call through, then rejects calls until `window` has elapsed.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window, last_fired: None }
    }

    /// Returns `true` when the caller may proceed, and records the firing.
    pub fn try_fire(&mut self) -> bool {
        self.try_fire_at(Instant::now())
    }

    fn try_fire_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_fired {
            if now.duration_since(last) < self.window {
                return false;
            }
        }
        self.last_fired = Some(now);
        true
    }
}
