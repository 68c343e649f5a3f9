//! Bounded retry with exponential backoff
//!
//! One [`RetryBudget`] covers a load/play attempt sequence. At most one retry
//! is ever pending; [`RetrySlot`] holds it with an absolute due time so the
//! controller can fire it from `poll()` without sleeping.

use crate::engine::LoadGeneration;
use crate::types::TrackRef;
use std::time::Duration;

/// Failure counter for one attempt sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
    max: u32,
    base_delay: Duration,
}

impl RetryBudget {
    pub fn new(max: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max,
            base_delay,
        }
    }

    /// Record a failure and return the delay before the next attempt
    ///
    /// `None` means the budget is spent and the failure is terminal.
    ///
    /// `max` counts failures, not retries: with the default of 3 the third
    /// failure is terminal, so only the 1 s and 2 s delays are ever used.
    /// Keep it that way; a 4 s retry would mean a fourth attempt.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts < self.max {
            Some(self.delay_for(self.attempts))
        } else {
            None
        }
    }

    /// `base * 2^(attempt - 1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max
    }
}

/// What a pending retry re-issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOp {
    /// Load the track again under a fresh generation
    Load(TrackRef),

    /// Call `play()` on the current resource
    Play,
}

/// A scheduled retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRetry {
    pub due: Duration,
    pub op: RetryOp,

    /// Load generation that failed; the retry is void once it is superseded
    pub generation: LoadGeneration,
}

/// Single-slot holder for the in-flight retry
#[derive(Debug, Clone, Default)]
pub struct RetrySlot {
    pending: Option<PendingRetry>,
}

impl RetrySlot {
    /// Schedule a retry; refused while another one is pending
    pub fn schedule(&mut self, retry: PendingRetry) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(retry);
        true
    }

    pub fn cancel(&mut self) -> Option<PendingRetry> {
        self.pending.take()
    }

    pub fn is_retrying(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingRetry> {
        self.pending.as_ref()
    }

    /// Remove and return the retry if it is due at `now`
    pub fn take_due(&mut self, now: Duration) -> Option<PendingRetry> {
        match self.pending {
            Some(retry) if retry.due <= now => self.pending.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReciterId, SurahId};

    #[test]
    fn third_failure_is_terminal() {
        let mut budget = RetryBudget::new(3, Duration::from_millis(1000));
        assert_eq!(budget.record_failure(), Some(Duration::from_secs(1)));
        assert_eq!(budget.record_failure(), Some(Duration::from_secs(2)));
        assert_eq!(budget.record_failure(), None);
        assert!(budget.is_exhausted());

        budget.reset();
        assert_eq!(budget.attempts(), 0);
        assert_eq!(budget.record_failure(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn delays_double() {
        let budget = RetryBudget::new(5, Duration::from_millis(1000));
        assert_eq!(budget.delay_for(1), Duration::from_secs(1));
        assert_eq!(budget.delay_for(2), Duration::from_secs(2));
        assert_eq!(budget.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn zero_max_never_retries() {
        let mut budget = RetryBudget::new(0, Duration::from_millis(10));
        assert_eq!(budget.record_failure(), None);
    }

    #[test]
    fn slot_holds_one_retry() {
        let track = TrackRef::new(SurahId::FIRST, ReciterId(2));
        let mut slot = RetrySlot::default();
        let first = PendingRetry {
            due: Duration::from_secs(1),
            op: RetryOp::Load(track),
            generation: LoadGeneration(1),
        };

        assert!(slot.schedule(first));
        assert!(!slot.schedule(PendingRetry {
            op: RetryOp::Play,
            ..first
        }));
        assert!(slot.is_retrying());

        assert_eq!(slot.take_due(Duration::from_millis(999)), None);
        assert_eq!(slot.take_due(Duration::from_secs(1)), Some(first));
        assert!(!slot.is_retrying());
    }
}
