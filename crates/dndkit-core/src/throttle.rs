#![forbid(unsafe_code)]

//! Frame-interval throttling and distinct-change gating.
//!
//! [`Throttle`] bounds how often high-frequency events (pointer moves, scroll
//! notifications) are processed: the first event after a quiet interval is
//! delivered immediately, and events arriving inside the interval are
//! coalesced with a "latest wins" policy into one trailing delivery. Earlier
//! coalesced events are superseded, never queued.
//!
//! [`DistinctGate`] suppresses repeated applications of an unchanged value so
//! that identical visual updates do not touch the host document twice.
//!
//! Time is always passed in explicitly, so behavior is deterministic under
//! test.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use dndkit_core::throttle::Throttle;
//! use web_time::Instant;
//!
//! let start = Instant::now();
//! let mut throttle = Throttle::new(Duration::from_millis(16));
//!
//! assert_eq!(throttle.push(1, start), Some(1));
//! assert_eq!(throttle.push(2, start + Duration::from_millis(4)), None);
//! assert_eq!(throttle.push(3, start + Duration::from_millis(8)), None);
//!
//! // The trailing delivery carries the latest event only.
//! assert_eq!(throttle.poll(start + Duration::from_millis(16)), Some(3));
//! assert!(!throttle.has_pending());
//! ```

use std::time::Duration;

use web_time::Instant;

/// Leading-edge throttle with a coalesced trailing event.
///
/// # Invariants
///
/// 1. At most one event is pending at any time.
/// 2. Two deliveries through [`push`](Self::push) or [`poll`](Self::poll) are
///    never closer than `interval`.
/// 3. [`flush`](Self::flush) always hands back the pending event regardless
///    of timing.
#[derive(Debug, Clone)]
pub struct Throttle<E> {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<E>,
    coalesced: u64,
}

impl<E> Throttle<E> {
    /// Create a throttle delivering at most one event per `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
            coalesced: 0,
        }
    }

    /// Configured interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Offer an event. Returns it back if it may be processed now; otherwise
    /// it replaces any pending event and `None` is returned.
    pub fn push(&mut self, event: E, now: Instant) -> Option<E> {
        if self.pending.is_none() && self.is_open(now) {
            self.last_emit = Some(now);
            return Some(event);
        }
        if self.pending.replace(event).is_some() {
            self.coalesced += 1;
        }
        if self.is_open(now) {
            self.last_emit = Some(now);
            return self.pending.take();
        }
        None
    }

    /// Deliver the pending event if the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<E> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_emit = Some(now);
            return self.pending.take();
        }
        None
    }

    /// Take the pending event immediately, ignoring the interval.
    pub fn flush(&mut self) -> Option<E> {
        self.pending.take()
    }

    /// When the pending event becomes deliverable, if one is pending.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(self.last_emit.map_or_else(Instant::now, |last| last + self.interval))
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of events superseded by a later one since creation.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }

    /// Drop any pending event and forget the last delivery time.
    pub fn clear(&mut self) {
        self.pending = None;
        self.last_emit = None;
    }
}

/// Passes a value through only when it differs from the last one passed.
#[derive(Debug, Clone, Default)]
pub struct DistinctGate<T> {
    last: Option<T>,
}

impl<T: PartialEq> DistinctGate<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Record `value`; returns true if it differs from the previous value.
    pub fn update(&mut self, value: T) -> bool {
        if self.last.as_ref() == Some(&value) {
            return false;
        }
        self.last = Some(value);
        true
    }

    /// Last value passed through the gate.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
