//! Process-wide least-recently-used cache of road legs.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dispatch_core::RouteLeg;
use geo::Coord;
use lru::LruCache;
use parking_lot::Mutex;

/// Entries kept before the least recently used leg is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Direction-sensitive cache key built from the exact bits of both
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegKey {
    from: [u64; 2],
    to: [u64; 2],
}

impl LegKey {
    /// Key for the leg from `from` to `to`.
    #[must_use]
    pub const fn new(from: Coord<f64>, to: Coord<f64>) -> Self {
        Self {
            from: [from.x.to_bits(), from.y.to_bits()],
            to: [to.x.to_bits(), to.y.to_bits()],
        }
    }
}

/// Thread-safe LRU map from [`LegKey`] to [`RouteLeg`].
///
/// The stitcher consults it before calling a provider. Only legs a provider
/// actually returned are stored; estimated legs are recomputed each time so
/// a recovered service is picked up on the next request.
pub struct LegCache {
    entries: Mutex<LruCache<LegKey, RouteLeg>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for LegCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

impl Default for LegCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl LegCache {
    /// Create an empty cache holding at most `capacity` legs (minimum one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(bound)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The cache shared by every stitcher that does not bring its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use dispatch_routing::LegCache;
    ///
    /// assert!(Arc::ptr_eq(&LegCache::global(), &LegCache::global()));
    /// ```
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<LegCache>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::default())))
    }

    /// Look up a leg, marking it most recently used.
    #[must_use]
    pub fn get(&self, key: &LegKey) -> Option<RouteLeg> {
        let found = self.entries.lock().get(key).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a leg, evicting the least recently used entry when full.
    pub fn insert(&self, key: LegKey, leg: RouteLeg) {
        self.entries.lock().put(key, leg);
    }

    /// Drop every entry and reset the hit and miss counters.
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of cached legs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no legs are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached legs.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Lookups that found a leg since the last [`clear`](Self::clear).
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing since the last [`clear`](Self::clear).
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
