//! Extension points of [`LruCache`](crate::LruCache).
//!
//! A cache is generic over one [`CacheHooks`] implementation which decides how
//! values are created on a miss, how much each entry weighs and what happens
//! when an entry leaves the cache.

use std::fmt::Debug;

/// Hooks invoked by the cache. Every method has a default, so implementors
/// only override what they need.
pub trait CacheHooks<K, V>: Send + Sync {
    /// Computes a value for a key which missed. Runs without the cache lock
    /// held, so it may be slow or call back into the cache.
    fn create(&self, _key: &K) -> Option<V> {
        None
    }

    /// Cost of one entry. Must not be negative.
    ///
    /// Called once when a value is stored; the result is recorded with the
    /// entry and subtracted again when it leaves.
    fn weight_of(&self, _key: &K, _value: &V) -> isize {
        1
    }

    /// Called for every entry leaving the cache, with no lock held.
    ///
    /// `evicted` is true only for removals made to enforce the capacity.
    /// `new_value` is set when `old_value` was displaced by another value for
    /// the same key.
    fn on_entry_removed(&self, _evicted: bool, _key: &K, _old_value: &V, _new_value: Option<&V>) {}
}

/// Hooks with every default: nothing is created, every entry weighs 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitHooks;

impl<K, V> CacheHooks<K, V> for UnitHooks {}

type CreateFn<K, V> = Box<dyn Fn(&K) -> Option<V> + Send + Sync>;
type WeightFn<K, V> = Box<dyn Fn(&K, &V) -> isize + Send + Sync>;
type RemovalFn<K, V> = Box<dyn Fn(bool, &K, &V, Option<&V>) + Send + Sync>;

/// Hooks backed by closures.
///
/// ```
/// use softlru::{FnHooks, LruCache};
///
/// let hooks = FnHooks::new()
///     .with_create(|key: &u32| Some(key.to_string()))
///     .with_weight(|_, value: &String| value.len() as isize);
/// let cache = LruCache::with_hooks(16, hooks).unwrap();
///
/// assert_eq!(cache.get(&123).unwrap().as_deref(), Some("123"));
/// assert_eq!(cache.size(), 3);
/// ```
pub struct FnHooks<K, V> {
    create: Option<CreateFn<K, V>>,
    weight: Option<WeightFn<K, V>>,
    removal: Option<RemovalFn<K, V>>,
}

impl<K, V> Default for FnHooks<K, V> {
    fn default() -> Self {
        Self {
            create: None,
            weight: None,
            removal: None,
        }
    }
}

impl<K, V> FnHooks<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create(mut self, f: impl Fn(&K) -> Option<V> + Send + Sync + 'static) -> Self {
        self.create = Some(Box::new(f));
        self
    }

    pub fn with_weight(mut self, f: impl Fn(&K, &V) -> isize + Send + Sync + 'static) -> Self {
        self.weight = Some(Box::new(f));
        self
    }

    pub fn with_removal_listener(
        mut self,
        f: impl Fn(bool, &K, &V, Option<&V>) + Send + Sync + 'static,
    ) -> Self {
        self.removal = Some(Box::new(f));
        self
    }
}

impl<K, V> Debug for FnHooks<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHooks")
            .field("create", &self.create.is_some())
            .field("weight", &self.weight.is_some())
            .field("removal", &self.removal.is_some())
            .finish()
    }
}

impl<K, V> CacheHooks<K, V> for FnHooks<K, V> {
    fn create(&self, key: &K) -> Option<V> {
        self.create.as_ref().and_then(|f| f(key))
    }

    fn weight_of(&self, key: &K, value: &V) -> isize {
        self.weight.as_ref().map_or(1, |f| f(key, value))
    }

    fn on_entry_removed(&self, evicted: bool, key: &K, old_value: &V, new_value: Option<&V>) {
        if let Some(f) = &self.removal {
            f(evicted, key, old_value, new_value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::{CacheHooks, FnHooks, UnitHooks};

    #[test]
    fn test_unit_hooks_defaults() {
        let hooks = UnitHooks;
        assert_eq!(<UnitHooks as CacheHooks<u32, u32>>::create(&hooks, &1), None);
        assert_eq!(<UnitHooks as CacheHooks<u32, u32>>::weight_of(&hooks, &1, &100), 1);
    }

    #[test]
    fn test_fn_hooks_fall_back_to_defaults() {
        let hooks: FnHooks<u32, String> = FnHooks::new();
        assert_eq!(hooks.create(&1), None);
        assert_eq!(hooks.weight_of(&1, &"abc".to_owned()), 1);
        hooks.on_entry_removed(true, &1, &"abc".to_owned(), None);
    }

    #[test]
    fn test_fn_hooks_dispatch() {
        let removed = Arc::new(AtomicUsize::new(0));
        let counter = removed.clone();
        let hooks = FnHooks::new()
            .with_create(|key: &u32| (*key > 10).then(|| key * 2))
            .with_weight(|_, value: &u32| *value as isize)
            .with_removal_listener(move |evicted, _, _, _| {
                if evicted {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            });

        assert_eq!(hooks.create(&3), None);
        assert_eq!(hooks.create(&20), Some(40));
        assert_eq!(hooks.weight_of(&0, &7), 7);

        hooks.on_entry_removed(true, &1, &1, None);
        hooks.on_entry_removed(false, &1, &1, Some(&2));
        assert_eq!(removed.load(Ordering::Relaxed), 1);
        assert_eq!(
            format!("{:?}", hooks),
            "FnHooks { create: true, weight: true, removal: true }"
        );
    }
}
