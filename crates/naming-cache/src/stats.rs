//! Route cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for route snapshot cache operations.
///
/// All counters are atomic and safe to read from any thread.
#[derive(Debug, Default)]
pub struct RouteCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    records: AtomicU64,
    invalidations: AtomicU64,
}

impl RouteCacheStats {
    /// Create zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lookup that found a current snapshot.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup that found nothing, or only a stale snapshot.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a snapshot being stored.
    #[inline]
    pub fn record_store(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an epoch bump.
    #[inline]
    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Total hits.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total misses.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Total snapshots stored.
    #[inline]
    pub fn stores(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Total epoch bumps.
    #[inline]
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Hit rate in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }
}
