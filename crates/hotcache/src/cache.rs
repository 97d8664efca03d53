//! HotCache: bounded key-value cache with LRU eviction

use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::Hash;

use ahash::RandomState;

use crate::error::{Error, Result};
use crate::iter::{Iter, Keys, Values};
use crate::lru::{Admission, LruStore};
use crate::stats::CacheStats;

/// Capacity used when none is specified
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded key-value cache with least-recently-used eviction
///
/// Every operation is O(1) amortized. [`get`](HotCache::get) and the
/// insert operations mark the touched key most recently used; when an
/// insert would exceed capacity, the least recently used entry is
/// evicted first. [`peek`](HotCache::peek) and iteration read without
/// touching anything.
///
/// The cache owns its lookup table and recency list privately; all
/// mutation goes through the methods below.
pub struct HotCache<K, V> {
    /// Recency engine: lookup table plus recency list
    store: LruStore<K, V>,

    /// Hit/miss accounting
    stats: CacheStats,
}

impl<K, V> HotCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` entries
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of resident entries, fixed for the
    ///   life of the cache
    ///
    /// # Returns
    /// * `Result<HotCache>` - Fails with [`Error::InvalidCapacity`] when
    ///   `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        Ok(Self {
            store: LruStore::new(capacity),
            stats: CacheStats::new(),
        })
    }

    /// Get a value, marking the key most recently used
    ///
    /// Counts a hit or a miss. An absent key is a normal `None` result,
    /// not an error.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.store.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Get a value without touching recency order or statistics
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.store.peek(key)
    }

    /// Insert or replace a value, marking the key most recently used
    ///
    /// Inserting a new key into a full cache evicts the least recently
    /// used entry first. Replacing a resident key never evicts.
    pub fn put(&mut self, key: K, value: V) {
        if self.store.put(key, value).is_some() {
            self.stats.record_eviction();
        }
        self.stats.record_insert();
    }

    /// Get a value, computing and inserting it on absence
    ///
    /// A resident key behaves exactly like [`get`](HotCache::get) and the
    /// producer is not invoked. An absent key counts one miss, then the
    /// producer's value is installed with [`put`](HotCache::put)
    /// semantics.
    pub fn get_or_put<F>(&mut self, key: K, producer: F) -> &V
    where
        F: FnOnce() -> V,
    {
        match self.try_get_or_put(key, || Ok::<_, Infallible>(producer())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_or_put`](HotCache::get_or_put)
    ///
    /// A producer error propagates unchanged and leaves the cache
    /// contents exactly as they were; the miss already counted for the
    /// presence check stands.
    pub fn try_get_or_put<F, E>(&mut self, key: K, producer: F) -> Result<&V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let stats = &mut self.stats;
        let admitted = self.store.try_get_or_insert_with(key, || {
            stats.record_miss();
            producer()
        });

        match admitted {
            Ok((value, Admission::Hit)) => {
                self.stats.record_hit();
                Ok(value)
            }
            Ok((value, Admission::Inserted { evicted })) => {
                self.stats.record_insert();
                if evicted.is_some() {
                    self.stats.record_eviction();
                }
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    /// Remove a key, returning its value if it was resident
    ///
    /// Does not affect statistics.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.store.remove(key)
    }

    /// Manually evict the least recently used entry
    ///
    /// Returns the evicted pair, or `None` when the cache is empty.
    pub fn evict(&mut self) -> Option<(K, V)> {
        let evicted = self.store.pop_head();
        if evicted.is_some() {
            self.stats.record_eviction();
        }
        evicted
    }

    /// Drop all entries
    ///
    /// Statistics keep counting across a clear; use
    /// [`reset_stats`](HotCache::reset_stats) to zero them.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Check residency without touching recency order or statistics
    pub fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Insert every pair in order, with full [`put`](HotCache::put)
    /// semantics per pair
    ///
    /// A key repeated later in the batch overwrites its earlier value,
    /// exactly as repeated individual puts would.
    pub fn put_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Look up every key with full [`get`](HotCache::get) semantics,
    /// collecting the present ones
    ///
    /// Absent keys are omitted from the result, not represented as
    /// `None` entries.
    pub fn get_all<'a, I>(&mut self, keys: I) -> HashMap<K, V, RandomState>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
        V: Clone,
    {
        let mut found = HashMap::with_hasher(RandomState::new());
        for key in keys {
            if let Some(value) = self.get(key) {
                found.insert(key.clone(), value.clone());
            }
        }
        found
    }

    /// Remove every key, returning how many were actually resident
    pub fn remove_all<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut removed = 0;
        for key in keys {
            if self.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Invoke a callback per entry, least- to most-recently-used
    ///
    /// Reads without touching recency order or statistics.
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in self.iter() {
            callback(key, value);
        }
    }

    /// Iterate over `(&key, &value)` pairs, least- to most-recently-used
    ///
    /// Each call yields a fresh iterator over the state at call time;
    /// iterating touches nothing.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.store)
    }

    /// Iterate over keys, least- to most-recently-used
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(&self.store)
    }

    /// Iterate over values, least- to most-recently-used
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(&self.store)
    }

    /// Get the current number of resident entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get the fixed capacity
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Zero the statistics counters, leaving cache contents alone
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl<K, V> Default for HotCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache with [`DEFAULT_CAPACITY`]
    fn default() -> Self {
        Self {
            store: LruStore::new(DEFAULT_CAPACITY),
            stats: CacheStats::new(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a HotCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        Iter::new(&self.store)
    }
}
