//! Expired Entry Purge Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! Lazy expiry on the read and write paths already keeps lapsed entries
//! invisible; this task only reclaims their memory between touches, so
//! running it is strictly optional.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoCache;

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// runs and calling [`MemoCache::purge_expired`] on each wake-up.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the
/// task during graceful shutdown. The cache itself needs no teardown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(
///     MemoCache::builder().ttl(Duration::from_secs(60)).build()?,
/// );
/// let purge_handle = spawn_purge_task(Arc::clone(&cache), Duration::from_secs(5));
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task<V>(cache: Arc<MemoCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "starting expired entry purge task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!(removed, "purge run removed expired entries");
            } else {
                debug!("purge run found no expired entries");
            }
        }
    })
}
