use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

use parking_lot::Mutex;

use crate::{
    error::{Error, Result, inconsistent},
    hooks::{CacheHooks, UnitHooks},
    linked_table::LinkedTable,
    stats::{CacheStats, Counters},
};

struct CacheState<K, V> {
    map: LinkedTable<K, V>,
    size: usize,
    capacity: usize,
    counters: Counters,
}

impl<K, V> CacheState<K, V> {
    fn acquire(&mut self, name: &str, charge: usize) -> Result<()> {
        match self.size.checked_add(charge) {
            Some(size) => {
                self.size = size;
                Ok(())
            }
            None => Err(inconsistent(
                name,
                format!("size {} cannot take a charge of {}", self.size, charge),
            )),
        }
    }

    fn release(&mut self, name: &str, charge: usize) -> Result<()> {
        match self.size.checked_sub(charge) {
            Some(size) => {
                self.size = size;
                Ok(())
            }
            None => Err(inconsistent(
                name,
                format!("size {} cannot release a charge of {}", self.size, charge),
            )),
        }
    }

    fn check_consistency(&self, name: &str) -> Result<()> {
        if self.map.is_empty() && self.size != 0 {
            return Err(inconsistent(
                name,
                format!("cache is empty but reports a size of {}", self.size),
            ));
        }
        Ok(())
    }
}

/// A thread safe cache which keeps the summed weight of its entries below a
/// capacity by evicting the least recently used entries.
///
/// Weights, value creation on a miss and removal notifications are supplied by
/// the [`CacheHooks`] the cache is built with. Hooks are never called while the
/// internal lock is held. A panicking hook unwinds into the caller of the
/// operation which triggered it; the work that operation already did to the
/// cache is kept.
///
/// ```
/// use softlru::LruCache;
///
/// let cache = LruCache::new(2).unwrap();
/// cache.put("a", 1).unwrap();
/// cache.put("b", 2).unwrap();
/// assert_eq!(cache.get(&"a").unwrap(), Some(1));
///
/// // "b" is now the least recently used entry
/// cache.put("c", 3).unwrap();
/// assert_eq!(cache.get(&"b").unwrap(), None);
/// assert_eq!(cache.eviction_count(), 1);
/// ```
pub struct LruCache<K, V, H = UnitHooks> {
    name: String,
    state: Mutex<CacheState<K, V>>,
    hooks: H,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache where every entry weighs 1, so `capacity` bounds the
    /// number of entries.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hooks(capacity, UnitHooks)
    }
}

impl<K, V, H> LruCache<K, V, H>
where
    K: Hash + Eq + Clone,
    V: Clone,
    H: CacheHooks<K, V>,
{
    pub fn with_hooks(capacity: usize, hooks: H) -> Result<Self> {
        Self::open("lru".to_owned(), capacity, 0, hooks)
    }

    pub(crate) fn open(
        name: String,
        capacity: usize,
        table_capacity: usize,
        hooks: H,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        tracing::debug!(cache = name.as_str(), capacity, "open lru cache");

        let state = CacheState {
            map: LinkedTable::with_capacity(table_capacity),
            size: 0,
            capacity,
            counters: Counters::default(),
        };
        Ok(Self {
            name,
            state: Mutex::new(state),
            hooks,
        })
    }

    fn weigh(&self, key: &K, value: &V) -> Result<usize> {
        self.to_charge(self.hooks.weight_of(key, value))
    }

    fn to_charge(&self, weight: isize) -> Result<usize> {
        usize::try_from(weight).map_err(|_| {
            inconsistent(
                &self.name,
                format!("weight_of returned a negative weight: {}", weight),
            )
        })
    }

    /// Changes the capacity and evicts entries until the cache fits.
    pub fn resize(&self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        self.state.lock().capacity = capacity;
        tracing::debug!(cache = self.name.as_str(), capacity, "resize lru cache");

        self.trim_to(Some(capacity))
    }

    /// Returns the value for `key` and marks it as the most recently used one.
    ///
    /// On a miss the value is requested from [`CacheHooks::create`] without
    /// holding the lock. If another caller stored a value for the same key in
    /// the meantime, the created value is discarded (and reported through
    /// [`CacheHooks::on_entry_removed`]) and the stored one is returned.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        {
            let mut state = self.state.lock();
            if let Some(value) = state.map.get(key).cloned() {
                state.counters.hits += 1;
                return Ok(Some(value));
            }
            state.counters.misses += 1;
        }

        let Some(created) = self.hooks.create(key) else {
            return Ok(None);
        };
        // only converted once the value is committed, a discarded value is never sized
        let weight = self.hooks.weight_of(key, &created);

        let (existing, capacity) = {
            let mut state = self.state.lock();
            state.counters.creates += 1;
            match state.map.get(key).cloned() {
                Some(existing) => (Some(existing), state.capacity),
                None => {
                    let charge = self.to_charge(weight)?;
                    state.acquire(&self.name, charge)?;
                    state.map.insert(key.clone(), created.clone(), charge);
                    (None, state.capacity)
                }
            }
        };

        match existing {
            Some(existing) => {
                tracing::trace!(
                    cache = self.name.as_str(),
                    "discard created value, the key was stored concurrently"
                );
                self.hooks
                    .on_entry_removed(false, key, &created, Some(&existing));
                Ok(Some(existing))
            }
            None => {
                self.trim_to(Some(capacity))?;
                Ok(Some(created))
            }
        }
    }

    /// Stores `value` as the most recently used entry and returns the value it
    /// replaced.
    pub fn put(&self, key: K, value: V) -> Result<Option<V>> {
        let charge = self.weigh(&key, &value)?;

        let (replaced, capacity) = {
            let mut state = self.state.lock();
            state.acquire(&self.name, charge)?;
            state.counters.puts += 1;
            let replaced = state.map.insert(key, value, charge);
            let replaced = match replaced {
                Some((key, old_value, old_charge)) => {
                    state.release(&self.name, old_charge)?;
                    let new_value = state.map.peek(&key).cloned();
                    Some((key, old_value, new_value))
                }
                None => None,
            };
            (replaced, state.capacity)
        };

        let previous = replaced.map(|(key, old_value, new_value)| {
            self.hooks
                .on_entry_removed(false, &key, &old_value, new_value.as_ref());
            old_value
        });

        self.trim_to(Some(capacity))?;
        Ok(previous)
    }

    pub fn remove(&self, key: &K) -> Result<Option<V>> {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.map.remove(key);
            match removed {
                Some((key, value, charge)) => {
                    state.release(&self.name, charge)?;
                    Some((key, value))
                }
                None => None,
            }
        };

        Ok(removed.map(|(key, value)| {
            self.hooks.on_entry_removed(false, &key, &value, None);
            value
        }))
    }

    /// Evicts least recently used entries until the size is at most `max_size`.
    pub fn trim_to_size(&self, max_size: usize) -> Result<()> {
        self.trim_to(Some(max_size))
    }

    /// Evicts every entry, including the ones weighing nothing.
    pub fn evict_all(&self) -> Result<()> {
        self.trim_to(None)
    }

    /// Evicts one entry per lock acquisition and notifies the hooks in
    /// between. `None` drains the cache.
    fn trim_to(&self, max_size: Option<usize>) -> Result<()> {
        loop {
            let (key, value) = {
                let mut state = self.state.lock();
                state.check_consistency(&self.name)?;

                if max_size.is_some_and(|max_size| state.size <= max_size) {
                    break;
                }
                let Some((key, value, charge)) = state.map.pop_lru() else {
                    break;
                };
                state.release(&self.name, charge)?;
                state.counters.evictions += 1;
                (key, value)
            };

            tracing::trace!(cache = self.name.as_str(), "evict least recently used entry");
            self.hooks.on_entry_removed(true, &key, &value, None);
        }
        Ok(())
    }

    /// Returns the value for `key` without touching the access order or the
    /// statistics.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.state.lock().map.peek(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.state.lock().map.contains(key)
    }

    /// Copies all entries, ordered from the least to the most recently used.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.state
            .lock()
            .map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats::new(state.size, state.capacity, state.map.len(), state.counters)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Summed weight of all entries.
    pub fn size(&self) -> usize {
        self.state.lock().size
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.state.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().map.is_empty()
    }

    pub fn hit_count(&self) -> u64 {
        self.state.lock().counters.hits
    }

    pub fn miss_count(&self) -> u64 {
        self.state.lock().counters.misses
    }

    /// Number of values produced by [`CacheHooks::create`], including the
    /// ones discarded because the key was stored concurrently.
    pub fn create_count(&self) -> u64 {
        self.state.lock().counters.creates
    }

    pub fn put_count(&self) -> u64 {
        self.state.lock().counters.puts
    }

    pub fn eviction_count(&self) -> u64 {
        self.state.lock().counters.evictions
    }
}

impl<K, V, H> Display for LruCache<K, V, H>
where
    K: Hash + Eq + Clone,
    V: Clone,
    H: CacheHooks<K, V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.stats(), f)
    }
}

impl<K, V, H> Debug for LruCache<K, V, H>
where
    K: Hash + Eq + Clone,
    V: Clone,
    H: CacheHooks<K, V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}
