use std::hash::BuildHasherDefault;

use hashbrown::{HashMap, HashSet};

use ec_core::ChunkKey;

type FxBuildHasher = BuildHasherDefault<rustc_hash::FxHasher>;

/// Keeps track of the chunks attached to the scene, along with the ones that should be detached
/// once enough of them have accumulated.
pub struct VisibilityTracker<H> {
    /// The chunks currently attached to the scene, and the handle of their content.
    attached: HashMap<ChunkKey, H, FxBuildHasher>,
    /// The attached chunks that are no longer needed.
    ///
    /// This is always a subset of the keys of `attached`.
    pending: HashSet<ChunkKey, FxBuildHasher>,
}

impl<H> Default for VisibilityTracker<H> {
    fn default() -> Self {
        Self {
            attached: HashMap::default(),
            pending: HashSet::default(),
        }
    }
}

impl<H> VisibilityTracker<H> {
    /// Returns whether the provided chunk is attached to the scene.
    #[inline]
    pub fn is_visible(&self, key: ChunkKey) -> bool {
        self.attached.contains_key(&key)
    }

    /// Returns the handle of an attached chunk.
    #[cfg(test)]
    #[inline]
    pub fn handle(&self, key: ChunkKey) -> Option<&H> {
        self.attached.get(&key)
    }

    /// The number of attached chunks.
    #[inline]
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    /// Whether no chunk is attached.
    #[cfg(test)]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    /// Returns an iterator over the attached chunks.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.attached.keys().copied()
    }

    /// Records that a chunk has been attached to the scene.
    ///
    /// # Panics
    ///
    /// This function panics if the chunk was already attached.
    pub fn insert(&mut self, key: ChunkKey, handle: H) {
        let previous = self.attached.insert(key, handle);
        assert!(previous.is_none(), "chunk {key} is already attached");
    }

    /// Marks an attached chunk as no longer needed.
    ///
    /// Returns whether the chunk was not already pending.
    ///
    /// # Panics
    ///
    /// This function panics if the chunk is not attached.
    pub fn mark_pending(&mut self, key: ChunkKey) -> bool {
        assert!(self.is_visible(key), "pending chunk {key} is not attached");
        self.pending.insert(key)
    }

    /// Removes a chunk from the pending set because it is needed again.
    ///
    /// Returns whether the chunk was pending.
    #[inline]
    pub fn rescue(&mut self, key: ChunkKey) -> bool {
        self.pending.remove(&key)
    }

    /// Returns whether the provided chunk is waiting to be detached.
    #[cfg(test)]
    #[inline]
    pub fn is_pending(&self, key: ChunkKey) -> bool {
        self.pending.contains(&key)
    }

    /// The number of chunks waiting to be detached.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns an iterator over the chunks waiting to be detached.
    #[cfg(test)]
    #[inline]
    pub fn pending(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.pending.iter().copied()
    }

    /// Forgets about all the pending chunks and returns their handles, farthest from `center`
    /// first.
    ///
    /// The pending set is empty afterwards.
    pub fn drain_pending(&mut self, center: ChunkKey) -> Vec<(ChunkKey, H)> {
        let mut keys: Vec<ChunkKey> = self.pending.drain().collect();
        keys.sort_unstable_by(|&a, &b| {
            b.chebyshev_distance(center)
                .cmp(&a.chebyshev_distance(center))
                .then(a.cmp(&b))
        });

        keys.into_iter()
            .filter_map(|key| self.attached.remove(&key).map(|handle| (key, handle)))
            .collect()
    }
}
