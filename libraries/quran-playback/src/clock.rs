//! Time sources
//!
//! The controller never sleeps: it records absolute due times and checks
//! them against a [`Clock`] whenever the host calls `poll()`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time since an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced explicitly by its owner
///
/// Used where the host supplies time itself (a JS timer loop passing
/// `performance.now()`, or tests). Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        // Never move backwards
        if now > self.now.get() {
            self.now.set(now);
        }
    }

    /// Set the time from a host timestamp in milliseconds
    ///
    /// Returns `false`, leaving the clock untouched, when the timestamp is
    /// negative, not finite or too large for a [`Duration`].
    pub fn set_millis(&self, now_ms: f64) -> bool {
        if now_ms < 0.0 {
            return false;
        }
        match Duration::try_from_secs_f64(now_ms / 1000.0) {
            Ok(now) => {
                self.set(now);
                true
            }
            Err(_) => false,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_and_monotonic() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Duration::from_millis(1500));

        handle.set(Duration::from_millis(200));
        assert_eq!(clock.now(), Duration::from_millis(1500));

        handle.set(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn host_timestamps_out_of_range_are_ignored() {
        let clock = ManualClock::new();
        assert!(clock.set_millis(2500.0));
        assert_eq!(clock.now(), Duration::from_millis(2500));

        assert!(!clock.set_millis(f64::MAX));
        assert!(!clock.set_millis(f64::NAN));
        assert!(!clock.set_millis(f64::INFINITY));
        assert!(!clock.set_millis(-1.0));
        assert_eq!(clock.now(), Duration::from_millis(2500));
    }
}
