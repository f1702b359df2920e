//! Double-buffered readers/writer container.
//!
//! [`ReadersWriterCache`] holds two generations of a value: one published
//! slot that any number of threads may read without blocking, and one
//! staging slot that a single logical writer populates. An explicit
//! [`swap`](ReadersWriterCache::swap) publishes the staging generation.
//!
//! Readers never observe a torn value: they only ever touch the published
//! generation, writers only ever touch the staging one, and `swap` is the
//! sole synchronization point. Suited to small, rarely-refreshed shared
//! data (a whitelist, a dictionary table, parsed config).

use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;

/// Two-generation container: lock-free reads of the published value,
/// mutex-guarded staging for the next one.
///
/// The contract assumes a single logical writer (one refresh thread, or
/// writers serialized externally); the staging mutex is a safety net, not a
/// coordination mechanism. Readers that obtained the published `Arc` before
/// a swap keep reading the previous generation until they drop it; there is
/// no "latest write visible immediately" guarantee, only that whatever a
/// reader sees is fully formed.
///
/// # Example
///
/// ```rust
/// use naming_cache::ReadersWriterCache;
/// use std::collections::HashSet;
///
/// let cache: ReadersWriterCache<HashSet<i32>> = ReadersWriterCache::new();
/// {
///     let mut staging = cache.writer();
///     staging.clear();
///     staging.insert(22);
/// }
/// cache.swap();
/// assert!(cache.reader().contains(&22));
/// ```
#[derive(Debug)]
pub struct ReadersWriterCache<T> {
    /// The generation visible to readers.
    published: ArcSwap<T>,
    /// The generation the writer is preparing.
    staging: Mutex<T>,
}

impl<T: Default> ReadersWriterCache<T> {
    /// Create a cache whose published generation is `T::default()`.
    pub fn new() -> Self {
        Self {
            published: ArcSwap::from_pointee(T::default()),
            staging: Mutex::new(T::default()),
        }
    }
}

impl<T: Default> Default for ReadersWriterCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadersWriterCache<T> {
    /// The currently published generation.
    ///
    /// O(1) and never blocks. Before the first [`swap`](Self::swap) this is
    /// the default-constructed value.
    #[inline]
    pub fn reader(&self) -> Arc<T> {
        self.published.load_full()
    }

    /// Exclusive access to the staging generation.
    ///
    /// The staging slot holds the previous published generation when it
    /// could be recycled, otherwise a default-constructed value; writers
    /// that want a clean slate must clear it first.
    pub fn writer(&self) -> MutexGuard<'_, T> {
        self.staging.lock().expect("staging lock poisoned")
    }
}

impl<T: Default> ReadersWriterCache<T> {
    /// Publish the staging generation.
    ///
    /// Must be called after the writer finished populating staging and
    /// before readers are expected to observe the new data. The previous
    /// published generation is recycled into the staging slot when no
    /// reader still holds it; otherwise staging is left default-constructed
    /// and the old generation is dropped once its last reader releases it.
    pub fn swap(&self) {
        let mut staging = self.staging.lock().expect("staging lock poisoned");
        let next = std::mem::take(&mut *staging);
        let previous = self.published.swap(Arc::new(next));
        if let Ok(reclaimed) = Arc::try_unwrap(previous) {
            *staging = reclaimed;
        }
    }
}
