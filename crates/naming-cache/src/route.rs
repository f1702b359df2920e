//! Route-rule snapshot cache.
//!
//! Selection bursts against the same callee repeatedly consult that
//! service's routing-rule state. [`RouteCache`] keeps immutable
//! [`RouteSnapshot`]s behind `Arc`s on two levels:
//!
//! - a process-wide sharded map written after each resolution
//! - a thread-local layer so successive calls on one worker thread skip
//!   the shared map entirely
//!
//! A background refresh bumps the cache epoch instead of touching reader
//! state; stale snapshots are discarded lazily on next access, while an
//! `Arc` held by an in-flight read keeps its snapshot alive until the read
//! completes. Thread-local entries release on thread teardown.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use naming_core::{ServiceKey, ServiceKeyHash};
use tracing::{debug, trace};

use crate::stats::RouteCacheStats;

/// Immutable record of a callee's routing-rule state at some epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSnapshot {
    service: ServiceKey,
    revision: String,
    epoch: u64,
}

impl RouteSnapshot {
    /// The service this snapshot describes.
    #[inline]
    pub fn service(&self) -> &ServiceKey {
        &self.service
    }

    /// Control-plane revision of the routing rule.
    #[inline]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Cache epoch the snapshot was taken in.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

thread_local! {
    // Keyed by (cache id, service digest) so independent caches sharing a
    // worker thread do not cross-talk.
    static LOCAL: RefCell<HashMap<(u64, ServiceKeyHash), Arc<RouteSnapshot>>> =
        RefCell::new(HashMap::new());
}

fn next_cache_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Epoch-invalidated, two-level cache of [`RouteSnapshot`]s.
#[derive(Debug)]
pub struct RouteCache {
    id: u64,
    epoch: AtomicU64,
    shared: DashMap<ServiceKeyHash, Arc<RouteSnapshot>>,
    stats: RouteCacheStats,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            id: next_cache_id(),
            epoch: AtomicU64::new(0),
            shared: DashMap::new(),
            stats: RouteCacheStats::new(),
        }
    }

    /// Current epoch.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Cache statistics.
    #[inline]
    pub fn stats(&self) -> &RouteCacheStats {
        &self.stats
    }

    /// Look up the snapshot for a service, if one from the current epoch
    /// exists.
    ///
    /// Checks the thread-local layer first; a shared-map hit repopulates
    /// it. Stale entries encountered on either level are dropped.
    pub fn get(&self, service: &ServiceKey) -> Option<Arc<RouteSnapshot>> {
        let epoch = self.epoch();
        let digest = service.digest();
        let local_key = (self.id, digest);

        let local_hit = LOCAL.with(|cell| {
            let mut local = cell.borrow_mut();
            match local.get(&local_key) {
                Some(snapshot) if snapshot.epoch == epoch => Some(Arc::clone(snapshot)),
                Some(_) => {
                    local.remove(&local_key);
                    None
                }
                None => None,
            }
        });
        if let Some(snapshot) = local_hit {
            self.stats.record_hit();
            trace!(service = %service, "route snapshot hit (thread-local)");
            return Some(snapshot);
        }

        // The Ref is cloned out and dropped before any other work.
        let shared_hit = self.shared.get(&digest).map(|r| Arc::clone(&*r));
        match shared_hit {
            Some(snapshot) if snapshot.epoch == epoch => {
                LOCAL.with(|cell| {
                    cell.borrow_mut().insert(local_key, Arc::clone(&snapshot));
                });
                self.stats.record_hit();
                trace!(service = %service, "route snapshot hit (shared)");
                Some(snapshot)
            }
            Some(_) => {
                self.shared.remove(&digest);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Store a snapshot for a service at the current epoch, on both levels.
    pub fn record(&self, service: ServiceKey, revision: impl Into<String>) -> Arc<RouteSnapshot> {
        let snapshot = Arc::new(RouteSnapshot {
            revision: revision.into(),
            epoch: self.epoch(),
            service,
        });
        let digest = snapshot.service.digest();
        self.shared.insert(digest, Arc::clone(&snapshot));
        LOCAL.with(|cell| {
            cell.borrow_mut()
                .insert((self.id, digest), Arc::clone(&snapshot));
        });
        self.stats.record_store();
        debug!(
            service = %snapshot.service,
            revision = %snapshot.revision,
            "recorded route snapshot"
        );
        snapshot
    }

    /// Invalidate every snapshot by bumping the epoch.
    ///
    /// Called by the background refresh path. Readers discard stale
    /// snapshots on their next access; snapshots still referenced by
    /// in-flight reads stay alive through their `Arc`.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.shared.clear();
        self.stats.record_invalidation();
        debug!(epoch = self.epoch(), "route snapshots invalidated");
    }

    /// Number of snapshots in the shared layer.
    pub fn shared_len(&self) -> usize {
        self.shared.len()
    }
}
