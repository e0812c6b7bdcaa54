use std::fmt::Display;

/// Running counters of a cache. They only ever grow.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counters {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) puts: u64,
    pub(crate) creates: u64,
    pub(crate) evictions: u64,
}

/// Point-in-time view of a cache, see [`LruCache::stats`](crate::LruCache::stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub len: usize,
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub creates: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub(crate) fn new(size: usize, capacity: usize, len: usize, counters: Counters) -> Self {
        Self {
            size,
            capacity,
            len,
            hits: counters.hits,
            misses: counters.misses,
            puts: counters.puts,
            creates: counters.creates,
            evictions: counters.evictions,
        }
    }

    /// Share of lookups which hit, in whole percent. 0 before the first lookup.
    pub fn hit_rate(&self) -> u64 {
        let accesses = self.hits + self.misses;
        if accesses == 0 {
            0
        } else {
            100 * self.hits / accesses
        }
    }
}

impl Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LruCache[capacity={},hits={},misses={},hitRate={}%]",
            self.capacity,
            self.hits,
            self.misses,
            self.hit_rate()
        )
    }
}
