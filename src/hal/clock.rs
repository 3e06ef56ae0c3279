//! Monotonic time source and deadlines
//!
//! Every wait in the crate goes through [`Clock`], so protocol settle times
//! and input windows can be driven by [`FakeClock`] in tests.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic clock with blocking sleep
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Block for at least `duration`
    fn sleep(&self, duration: Duration);

    fn sleep_ms(&self, ms: u64) {
        self.sleep(Duration::from_millis(ms));
    }

    fn sleep_us(&self, us: u64) {
        self.sleep(Duration::from_micros(us));
    }
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`
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

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock: `sleep` advances time instantly
#[derive(Debug, Default)]
pub struct FakeClock {
    now: Cell<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without sleeping
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// A point in time after which a bounded operation must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Duration,
}

impl Deadline {
    /// Deadline `budget` from the clock's current time
    pub fn after<C: Clock + ?Sized>(clock: &C, budget: Duration) -> Self {
        Self {
            at: clock.now().saturating_add(budget),
        }
    }

    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        clock.now() >= self.at
    }

    /// Time left before expiry, zero once expired
    pub fn remaining<C: Clock + ?Sized>(&self, clock: &C) -> Duration {
        self.at.saturating_sub(clock.now())
    }
}
