//! Pluggable Time Source
//!
//! Expiry decisions never read ambient time directly. The cache asks an
//! injected [`Clock`] for the current instant, so tests can substitute a
//! manually advanced clock and exercise TTL behavior deterministically.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

// == Clock Trait ==
/// Source of the current instant for TTL comparisons.
///
/// Implementations must be cheap to call; the cache reads the clock once
/// per operation, before taking its internal lock.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

// == System Clock ==
/// Clock backed by [`Instant::now`]. The default for production caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// == Manual Clock ==
/// Manually advanced clock for deterministic TTL tests.
///
/// Cloning shares the underlying time, so a test can keep one handle to
/// advance time while the cache reads through another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        *self.now.lock() += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
