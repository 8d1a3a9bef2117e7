//! Record metadata cache with a global expiry sweep
//!
//! Snapshots are keyed by record. Expiry is not tracked per entry: once the
//! time-to-live has elapsed since the last sweep, every snapshot is dropped
//! at once and the clock restarts.

use dashmap::DashMap;
use parish_meta::{MetaMap, RecordRef};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of snapshots currently held
    pub entry_count: u64,
    /// Reads served from a snapshot
    pub hits: u64,
    /// Reads that fetched from the host
    pub misses: u64,
    /// Global sweeps performed
    pub sweeps: u64,
}

/// Snapshot cache of record metadata maps
#[derive(Debug)]
pub struct MetaCache {
    entries: DashMap<RecordRef, Arc<MetaMap>>,
    ttl: Duration,
    last_sweep: Mutex<Instant>,
    hits: AtomicU64,
    misses: AtomicU64,
    sweeps: AtomicU64,
}

impl MetaCache {
    /// Create cache whose snapshots live at most `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            last_sweep: Mutex::new(Instant::now()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
        }
    }

    /// Configured time-to-live
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every snapshot if the time-to-live has elapsed since the last sweep
    ///
    /// Returns whether a sweep happened.
    pub fn sweep_if_expired(&self) -> bool {
        let now = Instant::now();
        let mut last_sweep = self.last_sweep.lock();
        if now.duration_since(*last_sweep) < self.ttl {
            return false;
        }

        let dropped = self.entries.len();
        self.entries.clear();
        *last_sweep = now;
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(dropped, "metadata cache swept");
        true
    }

    /// Snapshot for `record`, fetching it on a miss
    ///
    /// Runs the expiry sweep first. `fetch` is called without any cache lock
    /// held.
    pub fn get_or_fetch<F>(&self, record: &RecordRef, fetch: F) -> Arc<MetaMap>
    where
        F: FnOnce() -> MetaMap,
    {
        self.sweep_if_expired();

        if let Some(snapshot) = self.get(record) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(record = %record, "metadata cache hit");
            return snapshot;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(record = %record, "metadata cache miss");

        let snapshot = Arc::new(fetch());
        self.entries.insert(record.clone(), Arc::clone(&snapshot));
        snapshot
    }

    /// Cached snapshot, without sweeping or counting
    #[must_use]
    pub fn get(&self, record: &RecordRef) -> Option<Arc<MetaMap>> {
        self.entries.get(record).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a snapshot is cached for `record`
    #[inline]
    #[must_use]
    pub fn contains(&self, record: &RecordRef) -> bool {
        self.entries.contains_key(record)
    }

    /// Drop the snapshot for one record
    #[inline]
    pub fn invalidate(&self, record: &RecordRef) {
        self.entries.remove(record);
    }

    /// Drop every snapshot and restart the expiry clock
    pub fn invalidate_all(&self) {
        let mut last_sweep = self.last_sweep.lock();
        self.entries.clear();
        *last_sweep = Instant::now();
    }

    /// Number of cached snapshots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len() as u64,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetaCache {
    /// Cache with the default 50 ms time-to-live
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_CACHE_TTL_MS))
    }
}
