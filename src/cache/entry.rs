//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their expiry rule.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value together with the instant it was last written.
///
/// Expiry is measured from the most recent write (an insert, overwrite,
/// or successful compare-and-swap), never from the last read. Reads do
/// not renew an entry's lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant of the most recent write
    pub written_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now`.
    pub fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            written_at: now,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived `ttl` as of `now`.
    ///
    /// Boundary condition: an entry is expired once the full TTL has
    /// elapsed, so an entry written at `t` with TTL `d` is already
    /// absent at exactly `t + d`. A zero `ttl` disables expiry.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }
        now.saturating_duration_since(self.written_at) >= ttl
    }

    // == Time To Live ==
    /// Returns the remaining lifetime as of `now`, or None when expiry
    /// is disabled.
    ///
    /// Returns `Some(Duration::ZERO)` once the entry has expired.
    pub fn ttl_remaining(&self, now: Instant, ttl: Duration) -> Option<Duration> {
        if ttl.is_zero() {
            return None;
        }
        let age = now.saturating_duration_since(self.written_at);
        Some(ttl.saturating_sub(age))
    }
}
