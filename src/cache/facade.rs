//! Cache Façade Module
//!
//! The public operation set, composing the entry store, the capacity
//! bound and lazy expiry under a single mutual-exclusion guard.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::cache::store::EntryStore;
use crate::cache::CacheStats;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::ConfigError;

/// Notification invoked with the key and value of every entry removed
/// by the capacity bound. Never invoked for deletes or expiry.
pub type EvictCallback<V> = Box<dyn Fn(String, V) + Send + Sync>;

/// State guarded by the cache lock.
struct CacheInner<V> {
    store: EntryStore<V>,
    stats: CacheStats,
}

// == Memo Cache ==
/// A bounded in-memory key-value cache with LRU eviction, optional TTL
/// expiry, and an atomic compare-and-swap primitive.
///
/// Every operation runs as one critical section under an internal lock,
/// so concurrent callers observe the cache as a linearizable sequence
/// of operations. Values are cloned out on reads; wrap them in [`Arc`]
/// when clones should be cheap.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use memo_cache::MemoCache;
///
/// let cache: MemoCache<String> = MemoCache::builder()
///     .capacity(2)
///     .ttl(Duration::from_secs(60))
///     .build()
///     .unwrap();
///
/// assert_eq!(cache.put("a", "alpha".to_string()), None);
/// assert_eq!(cache.get("a"), Some("alpha".to_string()));
///
/// cache.put("b", "beta".to_string());
/// cache.put("c", "gamma".to_string()); // evicts "a", the least recently used
/// assert_eq!(cache.get("a"), None);
/// ```
pub struct MemoCache<V> {
    inner: Mutex<CacheInner<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    on_evict: Option<EvictCallback<V>>,
}

impl<V> MemoCache<V> {
    // == Construction ==

    /// Starts building a cache.
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    /// Creates an unbounded cache with no expiry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                store: EntryStore::new(0),
                stats: CacheStats::new(),
            }),
            config: CacheConfig::default(),
            clock: Arc::new(SystemClock),
            on_evict: None,
        }
    }

    /// Creates a cache from a configuration, validating it first.
    pub fn with_config(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    // == Get ==
    /// Retrieves the live value for `key`, promoting it to most
    /// recently used.
    ///
    /// An entry whose TTL has lapsed counts as absent and is dropped
    /// from the store on the way out.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if let Some(entry) = inner.store.lookup(key) {
            if entry.is_expired(now, self.config.ttl) {
                inner.store.remove(key);
                inner.stats.record_expiration();
                inner.stats.record_miss();
                let total = inner.store.len();
                inner.stats.set_total_entries(total);
                trace!(key, "dropped expired entry on read");
                return None;
            }

            let value = entry.value.clone();
            inner.store.touch(key);
            inner.stats.record_hit();
            Some(value)
        } else {
            inner.stats.record_miss();
            None
        }
    }

    // == Put ==
    /// Associates `value` with `key` and returns the value previously
    /// associated, if it was still live.
    ///
    /// A fresh key lands at the most-recently-used position with its
    /// TTL measured from now; an existing live entry is overwritten,
    /// its TTL reset and its recency promoted. If inserting a new key
    /// pushes the store past its capacity, the least recently used
    /// entry is evicted and the eviction notification fires after the
    /// internal lock is released.
    pub fn put(&self, key: &str, value: V) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        // A previous entry only counts as previous if still live.
        let prior_expired = match inner.store.lookup(key) {
            Some(entry) => entry.is_expired(now, self.config.ttl),
            None => false,
        };
        if prior_expired {
            inner.store.remove(key);
            inner.stats.record_expiration();
        }

        let previous = inner
            .store
            .insert_or_update(key, value, now)
            .map(|entry| entry.value);

        let evicted = self.enforce_capacity(&mut inner);
        let total = inner.store.len();
        inner.stats.set_total_entries(total);
        drop(inner);

        self.notify_evicted(evicted);
        previous
    }

    // == Delete ==
    /// Removes `key` unconditionally, live or expired. A no-op when the
    /// key is absent. Never fires the eviction notification.
    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.lock();
        if inner.store.remove(key).is_some() {
            let total = inner.store.len();
            inner.stats.set_total_entries(total);
        }
    }

    // == Compare And Swap ==
    /// Atomically replaces the value for `key` with `new` if the
    /// current live value equals `old`, where `None` stands for an
    /// absent key.
    ///
    /// On a match the entry is written (created when absent), its TTL
    /// reset and its recency promoted, and `(Some(new), true)` is
    /// returned. On a mismatch the store is left untouched, recency
    /// included, and `(current, false)` is returned so the caller can
    /// retry against the value actually present.
    ///
    /// A caller-level "no value" sentinel stays distinguishable from
    /// absence by instantiating the cache with `V = Option<T>`.
    pub fn compare_and_swap(&self, key: &str, old: Option<&V>, new: V) -> (Option<V>, bool)
    where
        V: Clone + PartialEq,
    {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        // Read the current live value without promoting recency.
        let mut lapsed = false;
        let matches = match inner.store.lookup(key) {
            Some(entry) if entry.is_expired(now, self.config.ttl) => {
                lapsed = true;
                old.is_none()
            }
            Some(entry) => old.is_some_and(|expected| entry.value == *expected),
            None => old.is_none(),
        };
        if lapsed {
            inner.store.remove(key);
            inner.stats.record_expiration();
        }

        if !matches {
            let current = inner.store.lookup(key).map(|entry| entry.value.clone());
            let total = inner.store.len();
            inner.stats.set_total_entries(total);
            return (current, false);
        }

        inner.store.insert_or_update(key, new.clone(), now);
        let evicted = self.enforce_capacity(&mut inner);
        let total = inner.store.len();
        inner.stats.set_total_entries(total);
        drop(inner);

        self.notify_evicted(evicted);
        (Some(new), true)
    }

    // == Length ==
    /// Returns the number of resident entries.
    ///
    /// This is a structural count: entries whose TTL has lapsed but
    /// which no operation has purged yet are still included.
    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    /// Returns true if the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().store.is_empty()
    }

    // == Purge Expired ==
    /// Drops every resident entry whose TTL has lapsed.
    ///
    /// Reads already treat expired entries as absent; purging only
    /// reclaims their memory and brings [`len`](Self::len) back in line
    /// with the live count. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        if self.config.ttl.is_zero() {
            return 0;
        }

        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .store
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.config.ttl))
            .map(|(key, _)| key.to_owned())
            .collect();

        for key in &expired {
            inner.store.remove(key);
            inner.stats.record_expiration();
        }
        let total = inner.store.len();
        inner.stats.set_total_entries(total);

        if !expired.is_empty() {
            trace!(count = expired.len(), "purged expired entries");
        }
        expired.len()
    }

    // == Stats ==
    /// Returns a snapshot of the performance counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.store.len());
        stats
    }

    // == Accessors ==

    /// The configured capacity bound; zero means unbounded.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// The configured TTL; zero means entries never expire.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    // == Internals ==

    /// Evicts least-recently-used entries until the capacity bound
    /// holds again. Must be called with the lock held; the returned
    /// pairs are for notification after release.
    fn enforce_capacity(&self, inner: &mut CacheInner<V>) -> Vec<(String, V)> {
        let mut evicted = Vec::new();
        if self.config.capacity == 0 {
            return evicted;
        }
        while inner.store.len() > self.config.capacity {
            match inner.store.evict_lru() {
                Some((key, entry)) => {
                    inner.stats.record_eviction();
                    debug!(key = %key, "evicted least recently used entry");
                    evicted.push((key, entry.value));
                }
                None => break,
            }
        }
        evicted
    }

    /// Delivers eviction notifications. Must be called with the lock
    /// released so the callback can re-enter the cache; a panicking
    /// callback is contained and logged.
    fn notify_evicted(&self, evicted: Vec<(String, V)>) {
        let Some(callback) = self.on_evict.as_ref() else {
            return;
        };
        for (key, value) in evicted {
            let logged_key = key.clone();
            if catch_unwind(AssertUnwindSafe(|| callback(key, value))).is_err() {
                error!(key = %logged_key, "eviction callback panicked");
            }
        }
    }
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for MemoCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

// == Cache Builder ==
/// Builder for [`MemoCache`], collecting configuration, the clock and
/// the eviction notification before validating the whole at `build`.
pub struct CacheBuilder<V> {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    on_evict: Option<EvictCallback<V>>,
}

impl<V> CacheBuilder<V> {
    /// Starts from the permissive defaults: unbounded, no expiry.
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            clock: Arc::new(SystemClock),
            on_evict: None,
        }
    }

    /// Replaces the whole configuration at once.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the TTL measured from each entry's most recent write.
    /// Zero disables expiry.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Sets the hard capacity bound. Zero means unbounded.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Pre-sizes the entry store without bounding it.
    pub fn initial_capacity(mut self, hint: usize) -> Self {
        self.config.initial_capacity = hint;
        self
    }

    /// Installs the eviction notification.
    pub fn on_evict<F>(mut self, callback: F) -> Self
    where
        F: Fn(String, V) + Send + Sync + 'static,
    {
        self.on_evict = Some(Box::new(callback));
        self
    }

    /// Substitutes the time source, e.g. a [`ManualClock`] in tests.
    ///
    /// [`ManualClock`]: crate::clock::ManualClock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates the configuration and builds the cache.
    pub fn build(self) -> Result<MemoCache<V>, ConfigError> {
        self.config.validate()?;
        Ok(MemoCache {
            inner: Mutex::new(CacheInner {
                store: EntryStore::new(self.config.initial_capacity),
                stats: CacheStats::new(),
            }),
            config: self.config,
            clock: self.clock,
            on_evict: self.on_evict,
        })
    }
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
