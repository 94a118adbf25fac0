//! Memo Cache - A bounded in-process key-value cache
//!
//! Provides LRU eviction, optional per-entry TTL expiry and an atomic
//! compare-and-swap primitive behind a thread-safe façade, for embedding
//! as a local memoization or lookup layer.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheBuilder, CacheEntry, CacheStats, EvictCallback, MemoCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::ConfigError;
pub use tasks::spawn_purge_task;
