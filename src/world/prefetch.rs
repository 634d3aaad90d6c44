use std::hash::BuildHasherDefault;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use ec_core::{ChunkContent, ChunkKey};
use ec_workers::{Priority, TaskPool, Worker};
use ec_worldgen_core::{ChunkGenerator, GenerateError};

type FxBuildHasher = BuildHasherDefault<rustc_hash::FxHasher>;

/// The worker state of the prefetcher's task pool.
struct PrefetchWorker {
    generator: Arc<dyn ChunkGenerator>,
}

impl Worker for PrefetchWorker {
    type Input = ChunkKey;
    type Output = (ChunkKey, Result<ChunkContent, GenerateError>);

    fn run(&mut self, key: ChunkKey) -> Self::Output {
        (key, self.generator.generate(key))
    }
}

/// Generates chunks just outside of the neighborhood in the background, so that they are ready
/// to be attached when the viewpoint gets there.
///
/// Results only ever reach the controlling thread through [`Prefetcher::collect`]; worker
/// threads never touch the scene or the cache.
pub struct Prefetcher {
    /// The task pool generating the chunks.
    pool: TaskPool<ChunkKey, (ChunkKey, Result<ChunkContent, GenerateError>)>,
    /// The chunks that have been submitted to the pool but are not ready yet.
    requested: HashSet<ChunkKey, FxBuildHasher>,
    /// The chunks that have been generated and are waiting to be attached.
    ready: HashMap<ChunkKey, ChunkContent, FxBuildHasher>,
}

impl Prefetcher {
    /// Creates a new [`Prefetcher`] running `worker_count` worker threads.
    pub fn new(generator: Arc<dyn ChunkGenerator>, worker_count: usize) -> Self {
        ec_log::trace!("starting {worker_count} prefetch workers...");

        let pool = ec_workers::start((0..worker_count).map(|_| PrefetchWorker {
            generator: Arc::clone(&generator),
        }));

        Self {
            pool,
            requested: HashSet::default(),
            ready: HashMap::default(),
        }
    }

    /// Moves the chunks generated by the workers since the last call to the ready set.
    #[profiling::function]
    pub fn collect(&mut self) {
        for (key, result) in self.pool.fetch_results() {
            self.requested.remove(&key);

            match result {
                Ok(content) => {
                    self.ready.insert(key, content);
                }
                Err(err) => ec_log::warning!("failed to prefetch chunk {key}: {err}"),
            }
        }
    }

    /// Removes a ready chunk from the prefetcher and returns it.
    #[inline]
    pub fn take(&mut self, key: ChunkKey) -> Option<ChunkContent> {
        self.ready.remove(&key)
    }

    /// The number of chunks ready to be attached.
    #[inline]
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// The number of chunks submitted to the workers that are not ready yet.
    #[inline]
    pub fn requested_len(&self) -> usize {
        self.requested.len()
    }

    /// Requests the chunks surrounding the neighborhood of `center` to be generated.
    ///
    /// `known` tells whether a chunk is already visible or cached, in which case it is neither
    /// requested nor kept in the ready set.
    #[profiling::function]
    pub fn schedule(&mut self, center: ChunkKey, radius: u32, known: impl Fn(ChunkKey) -> bool) {
        let ring = radius + 1;

        // Queued requests that went out of the ring are not worth generating anymore.
        let requested = &mut self.requested;
        self.pool.retain_tasks(|&key| {
            let keep = key.chebyshev_distance(center) <= ring;
            if !keep {
                requested.remove(&key);
            }
            keep
        });

        self.ready
            .retain(|&key, _| key.chebyshev_distance(center) <= ring + 1 && !known(key));

        let mut batch = Vec::new();
        for key in center.ring(ring) {
            if known(key) || self.requested.contains(&key) || self.ready.contains_key(&key) {
                continue;
            }

            let d = (key.as_ivec2() - center.as_ivec2()).length_squared();
            batch.push((key, -(d as Priority)));
            self.requested.insert(key);
        }

        if !batch.is_empty() {
            ec_log::trace!("prefetching {} chunks around {center}", batch.len());
            self.pool.submit_batch(batch);
        }
    }
}
