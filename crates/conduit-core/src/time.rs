//! Thin wall-clock wrapper so components depend on a trait, not directly on
//! `Instant::now()` — lets tests substitute a fake clock for TTL/sweep logic
//! without sleeping in real time.

use std::time::{Duration, Instant};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock whose `now()` is advanced manually. Used by sweep/TTL tests.
pub struct FakeClock {
    inner: std::sync::Mutex<Instant>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: std::sync::Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.lock().expect("fake clock lock poisoned");
        *guard += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.inner.lock().expect("fake clock lock poisoned")
    }
}
