use std::hash::Hash;

use crate::{
    LruCache,
    error::Result,
    hooks::{CacheHooks, UnitHooks},
};

#[derive(Debug, Clone)]
pub struct LruCacheOptions {
    capacity: usize,

    table_capacity: usize,

    name: String,
}

impl Default for LruCacheOptions {
    fn default() -> Self {
        Self {
            capacity: 1024,
            table_capacity: 0,
            name: "lru".to_owned(),
        }
    }
}

impl LruCacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound on the summed weight of all entries
    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    /// Number of entries the hash index allocates room for up front
    pub fn table_capacity(&mut self, capacity: usize) -> &mut Self {
        self.table_capacity = capacity;
        self
    }

    /// Label attached to the cache's log events
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn build<K, V>(&self) -> Result<LruCache<K, V>>
    where
        K: Hash + Eq + Clone,
        V: Clone,
    {
        self.build_with_hooks(UnitHooks)
    }

    pub fn build_with_hooks<K, V, H>(&self, hooks: H) -> Result<LruCache<K, V, H>>
    where
        K: Hash + Eq + Clone,
        V: Clone,
        H: CacheHooks<K, V>,
    {
        LruCache::open(
            self.name.clone(),
            self.capacity,
            self.table_capacity,
            hooks,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;

    use super::LruCacheOptions;

    #[test]
    fn test_default_options() -> anyhow::Result<()> {
        let cache = LruCacheOptions::new().build::<u32, u32>()?;
        assert_eq!(cache.capacity(), 1024);
        assert_eq!(cache.name(), "lru");
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_custom_options() -> anyhow::Result<()> {
        let cache = LruCacheOptions::new()
            .capacity(2)
            .table_capacity(16)
            .name("images")
            .build::<&str, u32>()?;
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.name(), "images");

        cache.put("a", 1)?;
        cache.put("b", 2)?;
        cache.put("c", 3)?;
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains_key(&"a"));
        Ok(())
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let res = LruCacheOptions::new().capacity(0).build::<u32, u32>();
        assert!(matches!(res, Err(Error::InvalidCapacity(0))));
    }
}
