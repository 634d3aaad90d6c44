use std::collections::VecDeque;
use std::hash::BuildHasherDefault;

use hashbrown::HashMap;

use ec_core::{ChunkContent, ChunkKey};

/// A bounded store of chunk content that has been detached from the scene.
///
/// Entries are evicted in insertion order: reattaching a chunk removes it from the cache, so the
/// only "use" an entry ever gets is the one that ends its stay.
pub struct ChunkCache {
    /// The cached content.
    entries: HashMap<ChunkKey, ChunkContent, BuildHasherDefault<rustc_hash::FxHasher>>,
    /// The keys of `entries`, oldest first.
    order: VecDeque<ChunkKey>,
    /// The maximum number of entries.
    capacity: usize,
}

impl ChunkCache {
    /// Creates a new empty [`ChunkCache`] that holds at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::default(),
            order: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Returns whether the content of the provided chunk is cached.
    #[inline]
    pub fn has(&self, key: ChunkKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Removes the content of the provided chunk from the cache and returns it.
    pub fn take(&mut self, key: ChunkKey) -> Option<ChunkContent> {
        let content = self.entries.remove(&key)?;
        if let Some(index) = self.order.iter().position(|&k| k == key) {
            self.order.remove(index);
        }
        Some(content)
    }

    /// Inserts the content of a chunk in the cache.
    ///
    /// If the cache is over capacity afterwards, the oldest entry is removed and returned.
    ///
    /// # Panics
    ///
    /// This function panics if `key` is already cached.
    pub fn put(&mut self, key: ChunkKey, content: ChunkContent) -> Option<ChunkContent> {
        let previous = self.entries.insert(key, content);
        assert!(previous.is_none(), "chunk {key} is already cached");
        self.order.push_back(key);

        if self.order.len() <= self.capacity {
            return None;
        }

        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest)
    }

    /// The number of cached chunks.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[cfg(test)]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The maximum number of cached chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns an iterator over the cached keys, oldest first.
    #[cfg(test)]
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(x: i32) -> ChunkContent {
        ChunkContent::new(ChunkKey::new(x, 0))
    }

    #[test]
    fn take_removes_the_entry() {
        let mut cache = ChunkCache::new(4);
        let c = content(1);
        let id = c.id();

        assert!(cache.put(c.key(), c).is_none());
        assert!(cache.has(ChunkKey::new(1, 0)));

        let taken = cache.take(ChunkKey::new(1, 0)).unwrap();
        assert_eq!(taken.id(), id);
        assert!(!cache.has(ChunkKey::new(1, 0)));
        assert!(cache.take(ChunkKey::new(1, 0)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_in_insertion_order() {
        let mut cache = ChunkCache::new(3);
        for x in 0..3 {
            assert!(cache.put(ChunkKey::new(x, 0), content(x)).is_none());
        }

        let evicted = cache.put(ChunkKey::new(3, 0), content(3)).unwrap();
        assert_eq!(evicted.key(), ChunkKey::new(0, 0));
        assert_eq!(cache.len(), 3);
        assert!(!cache.has(ChunkKey::new(0, 0)));

        // Taking and putting back an entry makes it the newest one.
        let c1 = cache.take(ChunkKey::new(1, 0)).unwrap();
        assert!(cache.put(ChunkKey::new(1, 0), c1).is_none());
        let evicted = cache.put(ChunkKey::new(4, 0), content(4)).unwrap();
        assert_eq!(evicted.key(), ChunkKey::new(2, 0));

        let keys: Vec<_> = cache.keys().map(|k| k.x).collect();
        assert_eq!(keys, [3, 1, 4]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut cache = ChunkCache::new(10);
        for x in 0..50 {
            cache.put(ChunkKey::new(x, 0), content(x));
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 10);
    }

    #[test]
    #[should_panic]
    fn putting_a_cached_key_panics() {
        let mut cache = ChunkCache::new(4);
        cache.put(ChunkKey::ORIGIN, content(0));
        cache.put(ChunkKey::ORIGIN, content(0));
    }
}
