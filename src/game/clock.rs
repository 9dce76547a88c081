//! The fixed-interval clock that drives ticks
//!
//! The session never sleeps or spawns timers itself. It only arms and disarms
//! a [`TickClock`]; whoever owns the event loop asks the clock when the next
//! tick is due and calls `GameSession::tick` at that point.

use std::time::Duration;
use tokio::time::Instant;

/// A repeating timer the session can arm and disarm
pub trait TickClock {
    /// Start firing every `period`, replacing any previous schedule
    fn arm(&mut self, period: Duration);
    /// Stop firing
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
    /// Period of the current schedule, if armed
    fn period(&self) -> Option<Duration>;
}

/// Clock for tests and headless drivers: ticks happen when the caller says so
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualClock {
    period: Option<Duration>,
    /// Number of times the clock was armed
    pub arm_count: u32,
    /// Number of times an armed clock was disarmed
    pub disarm_count: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickClock for ManualClock {
    fn arm(&mut self, period: Duration) {
        self.period = Some(period);
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        if self.period.take().is_some() {
            self.disarm_count += 1;
        }
    }

    fn is_armed(&self) -> bool {
        self.period.is_some()
    }

    fn period(&self) -> Option<Duration> {
        self.period
    }
}

/// Wall-clock schedule on the tokio timer
#[derive(Debug, Clone, Default)]
pub struct DeadlineClock {
    period: Option<Duration>,
    next: Option<Instant>,
}

impl DeadlineClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// When the next tick is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Record that the due tick fired and schedule the one after it.
    ///
    /// A driver that fell behind skips the missed ticks instead of bursting.
    pub fn fire(&mut self, now: Instant) {
        if let (Some(period), Some(next)) = (self.period, self.next) {
            let mut following = next + period;
            if following <= now {
                following = now + period;
            }
            self.next = Some(following);
        }
    }
}

impl TickClock for DeadlineClock {
    fn arm(&mut self, period: Duration) {
        self.period = Some(period);
        self.next = Some(Instant::now() + period);
    }

    fn disarm(&mut self) {
        self.period = None;
        self.next = None;
    }

    fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    fn period(&self) -> Option<Duration> {
        self.period
    }
}
