use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::{self, MaybeUninit},
    ptr::{self, NonNull},
};

#[derive(Clone, Copy)]
struct KeyRef<K> {
    k: *const K,
}

impl<K> From<&K> for KeyRef<K> {
    fn from(value: &K) -> Self {
        Self { k: value }
    }
}

impl<K> Hash for KeyRef<K>
where
    K: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        unsafe {
            (*self.k).hash(state);
        }
    }
}

impl<K> PartialEq for KeyRef<K>
where
    K: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        unsafe { (*self.k).eq(&*other.k) }
    }
}

impl<K> Eq for KeyRef<K> where K: Eq {}

struct LruEntry<K, V> {
    charge: usize,
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
    prev: *mut Self,
    next: *mut Self,
}

impl<K, V> LruEntry<K, V> {
    fn sentinel() -> Self {
        Self {
            charge: 0,
            key: MaybeUninit::uninit(),
            value: MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    fn new(key: K, value: V, charge: usize) -> Self {
        Self {
            charge,
            key: MaybeUninit::new(key),
            value: MaybeUninit::new(value),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }
}

/// Hash table whose entries are threaded on a doubly linked list in access
/// order. `head.next` is the most recently used entry, `tail.prev` the least.
///
/// Every entry carries the charge it was stored with.
pub(crate) struct LinkedTable<K, V> {
    table: HashMap<KeyRef<K>, NonNull<LruEntry<K, V>>>,
    head: *mut LruEntry<K, V>,
    tail: *mut LruEntry<K, V>,
    _marker: PhantomData<Box<LruEntry<K, V>>>,
}

unsafe impl<K: Send, V: Send> Send for LinkedTable<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for LinkedTable<K, V> {}

impl<K, V> LinkedTable<K, V> {
    fn detach(&mut self, node: *mut LruEntry<K, V>) {
        unsafe {
            let prev = (*node).prev;
            let next = (*node).next;
            (*prev).next = next;
            (*next).prev = prev;
        }
    }

    fn attach(&mut self, node: *mut LruEntry<K, V>) {
        unsafe {
            // the sentinels are always linked, so `head.next` is never null
            let head = self.head;
            let next = (*head).next;
            (*node).prev = head;
            (*node).next = next;
            (*head).next = node;
            (*next).prev = node;
        }
    }

    fn promote(&mut self, node: *mut LruEntry<K, V>) {
        self.detach(node);
        self.attach(node);
    }

    /// Unlinks a node which was already dropped from the table and hands back
    /// its contents.
    fn release(&mut self, node: NonNull<LruEntry<K, V>>) -> (K, V, usize) {
        self.detach(node.as_ptr());
        unsafe {
            let entry = Box::from_raw(node.as_ptr());
            let LruEntry {
                charge, key, value, ..
            } = *entry;
            (key.assume_init(), value.assume_init(), charge)
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates from the least to the most recently used entry.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cursor: unsafe { (*self.tail).prev },
            head: self.head,
            remaining: self.len(),
            _marker: PhantomData,
        }
    }
}

impl<K, V> LinkedTable<K, V>
where
    K: Hash + Eq,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let head = Box::into_raw(Box::new(LruEntry::sentinel()));
        let tail = Box::into_raw(Box::new(LruEntry::sentinel()));
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        Self {
            table: HashMap::with_capacity(capacity),
            head,
            tail,
            _marker: PhantomData,
        }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.table.contains_key(&KeyRef::from(key))
    }

    /// Looks up a value without touching the access order.
    pub(crate) fn peek(&self, key: &K) -> Option<&V> {
        let node = self.table.get(&KeyRef::from(key))?;
        Some(unsafe { &*(*node.as_ptr()).value.as_ptr() })
    }

    /// Looks up a value and marks it as the most recently used one.
    pub(crate) fn get(&mut self, key: &K) -> Option<&V> {
        let node = self.table.get(&KeyRef::from(key)).copied()?;
        self.promote(node.as_ptr());
        Some(unsafe { &*(*node.as_ptr()).value.as_ptr() })
    }

    /// Stores `value` as the most recently used entry.
    ///
    /// If the key was present, its value and charge are swapped in place and
    /// the given key is handed back together with the displaced value and its
    /// charge.
    pub(crate) fn insert(&mut self, key: K, value: V, charge: usize) -> Option<(K, V, usize)> {
        if let Some(node) = self.table.get(&KeyRef::from(&key)).copied() {
            let node = node.as_ptr();
            let (old_value, old_charge) = unsafe {
                (
                    mem::replace((*node).value.assume_init_mut(), value),
                    mem::replace(&mut (*node).charge, charge),
                )
            };
            self.promote(node);
            return Some((key, old_value, old_charge));
        }

        let node = NonNull::from(Box::leak(Box::new(LruEntry::new(key, value, charge))));
        self.attach(node.as_ptr());
        let key_ref = KeyRef {
            k: unsafe { (*node.as_ptr()).key.as_ptr() },
        };
        self.table.insert(key_ref, node);
        None
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<(K, V, usize)> {
        let node = self.table.remove(&KeyRef::from(key))?;
        Some(self.release(node))
    }

    /// Removes the least recently used entry.
    pub(crate) fn pop_lru(&mut self) -> Option<(K, V, usize)> {
        let node = unsafe { (*self.tail).prev };
        if ptr::eq(node, self.head) {
            return None;
        }
        let key_ref = KeyRef {
            k: unsafe { (*node).key.as_ptr() },
        };
        let node = self.table.remove(&key_ref)?;
        Some(self.release(node))
    }
}

impl<K, V> Drop for LinkedTable<K, V> {
    fn drop(&mut self) {
        unsafe {
            let mut node = (*self.head).next;
            while !ptr::eq(node, self.tail) {
                let next = (*node).next;
                let mut entry = Box::from_raw(node);
                entry.key.assume_init_drop();
                entry.value.assume_init_drop();
                node = next;
            }
            self.table.clear();
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
    }
}

pub(crate) struct Iter<'a, K, V> {
    cursor: *const LruEntry<K, V>,
    head: *const LruEntry<K, V>,
    remaining: usize,
    _marker: PhantomData<&'a LruEntry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if ptr::eq(self.cursor, self.head) {
            return None;
        }
        unsafe {
            let entry = &*self.cursor;
            self.cursor = entry.prev;
            self.remaining -= 1;
            Some((&*entry.key.as_ptr(), &*entry.value.as_ptr()))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
