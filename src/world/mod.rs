//! Streams chunk content in and out of a scene as a viewpoint moves.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec3;
use smallvec::SmallVec;

use ec_core::{ChunkContent, ChunkKey};
use ec_worldgen_core::{ChunkGenerator, GenerateError};

mod cache;
pub use cache::*;

mod prefetch;
pub use prefetch::*;

mod scene;
pub use scene::*;

mod visibility;
pub use visibility::*;

bitflags! {
    /// Describes how the scene changed during a call to [`StreamingController::update`].
    ///
    /// A non-empty value means the scene changed and must be redrawn.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SceneChanges: u8 {
        /// Some chunks have been attached to the scene.
        const ATTACHED = 1 << 0;
        /// Some chunks have been detached from the scene.
        const DETACHED = 1 << 1;
    }
}

/// The configuration of a [`StreamingController`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamingConfig {
    /// The side length of a chunk, in world units.
    pub chunk_size: f32,
    /// The Chebyshev radius of the neighborhood that must be attached around the viewpoint.
    pub view_radius: u32,
    /// The maximum number of detached chunks kept in the cache.
    pub cache_capacity: usize,
    /// The number of out-of-range chunks that triggers a flush.
    pub flush_threshold: usize,
    /// The number of background threads generating chunks ahead of time. Zero disables
    /// prefetching.
    pub prefetch_workers: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 150.0,
            view_radius: 1,
            cache_capacity: 10,
            flush_threshold: 8,
            prefetch_workers: 0,
        }
    }
}

impl StreamingConfig {
    /// Checks that the configuration can be used to create a [`StreamingController`].
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.chunk_size.is_finite() || self.chunk_size <= 0.0 {
            return Err("`chunk_size` must be a positive number");
        }
        if self.flush_threshold == 0 {
            return Err("`flush_threshold` must be at least 1");
        }
        Ok(())
    }
}

/// An error that might occur while updating a [`StreamingController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The viewpoint has a NaN or infinite coordinate.
    NonFiniteViewpoint,
    /// The content of a missing chunk could not be generated.
    Generate(GenerateError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteViewpoint => f.write_str("the viewpoint is not a finite position"),
            Self::Generate(err) => write!(f, "failed to generate a chunk: {err}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NonFiniteViewpoint => None,
            Self::Generate(err) => Some(err),
        }
    }
}

impl From<GenerateError> for StreamError {
    #[inline]
    fn from(err: GenerateError) -> Self {
        Self::Generate(err)
    }
}

/// Counters describing what a [`StreamingController`] has done so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// The number of chunks generated on the controlling thread.
    pub generated: u64,
    /// The number of chunks reattached from the cache.
    pub restored: u64,
    /// The number of chunks attached from the prefetcher.
    pub prefetched: u64,
    /// The number of flushes.
    pub flushes: u64,
    /// The number of chunks moved to the cache.
    pub cached: u64,
    /// The number of chunks evicted from the cache and destroyed.
    pub evicted: u64,
}

/// Decides which chunks must be attached to a [`Scene`] for a given viewpoint, and moves chunk
/// content between the generator, the scene and the cache accordingly.
pub struct StreamingController<S: Scene> {
    /// The configuration of the controller.
    config: StreamingConfig,
    /// Produces the content of chunks seen for the first time.
    generator: Arc<dyn ChunkGenerator>,
    /// The chunks attached to the scene.
    visibility: VisibilityTracker<S::Handle>,
    /// The chunks detached from the scene.
    cache: ChunkCache,
    /// Generates chunks ahead of time, when enabled.
    prefetcher: Option<Prefetcher>,
    /// The chunk the viewpoint was in during the last successful update.
    center: Option<ChunkKey>,
    /// What happened so far.
    stats: StreamStats,
}

impl<S: Scene> StreamingController<S> {
    /// Creates a new [`StreamingController`].
    ///
    /// # Panics
    ///
    /// This function panics if `config` does not pass [`StreamingConfig::validate`].
    pub fn new(config: StreamingConfig, generator: Arc<dyn ChunkGenerator>) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid streaming configuration: {err}");
        }

        let prefetcher = (config.prefetch_workers > 0)
            .then(|| Prefetcher::new(Arc::clone(&generator), config.prefetch_workers));

        Self {
            cache: ChunkCache::new(config.cache_capacity),
            visibility: VisibilityTracker::default(),
            prefetcher,
            center: None,
            stats: StreamStats::default(),
            generator,
            config,
        }
    }

    /// The chunks attached to the scene.
    #[inline]
    pub fn visibility(&self) -> &VisibilityTracker<S::Handle> {
        &self.visibility
    }

    /// The chunks detached from the scene.
    #[inline]
    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// The prefetcher, if prefetching is enabled.
    #[inline]
    pub fn prefetcher(&self) -> Option<&Prefetcher> {
        self.prefetcher.as_ref()
    }

    /// The chunk the viewpoint was in during the last successful update.
    #[inline]
    pub fn center(&self) -> Option<ChunkKey> {
        self.center
    }

    /// What the controller has done so far.
    #[inline]
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Moves the chunks generated in the background since the last update to the ready set of
    /// the prefetcher.
    ///
    /// This is done automatically at the start of every update.
    #[inline]
    pub fn collect_prefetched(&mut self) {
        if let Some(prefetcher) = &mut self.prefetcher {
            prefetcher.collect();
        }
    }

    /// Updates the set of attached chunks for the provided viewpoint.
    ///
    /// Every chunk of the viewpoint's neighborhood is attached to `scene` when this function
    /// returns successfully. Chunks that left the neighborhood are detached in batches, once
    /// enough of them have accumulated.
    ///
    /// # Errors
    ///
    /// If a chunk fails to generate, the update is aborted. The chunks attached before the
    /// failure remain attached.
    #[profiling::function]
    pub fn update(&mut self, viewpoint: Vec3, scene: &mut S) -> Result<SceneChanges, StreamError> {
        if !viewpoint.is_finite() {
            return Err(StreamError::NonFiniteViewpoint);
        }

        let center = ChunkKey::from_world_pos(viewpoint, self.config.chunk_size);

        self.collect_prefetched();

        let radius = self.config.view_radius;
        let mut changes = SceneChanges::empty();

        for key in center.neighborhood(radius) {
            if self.visibility.is_visible(key) {
                self.visibility.rescue(key);
                continue;
            }

            let content = self.acquire(key)?;
            let handle = scene.attach(content);
            self.visibility.insert(key, handle);
            changes |= SceneChanges::ATTACHED;
        }

        if self.center != Some(center) {
            ec_log::trace!("viewpoint entered chunk {center}");
            self.center = Some(center);
        }

        let stale: SmallVec<[ChunkKey; 16]> = self
            .visibility
            .keys()
            .filter(|key| key.chebyshev_distance(center) > radius)
            .collect();
        for key in stale {
            self.visibility.mark_pending(key);
        }

        if self.visibility.pending_len() >= self.config.flush_threshold {
            self.flush(center, scene);
            changes |= SceneChanges::DETACHED;
        }

        if let Some(prefetcher) = &mut self.prefetcher {
            let visibility = &self.visibility;
            let cache = &self.cache;
            prefetcher.schedule(center, radius, |key| {
                visibility.is_visible(key) || cache.has(key)
            });
        }

        Ok(changes)
    }

    /// Returns the content of a chunk that is about to be attached.
    fn acquire(&mut self, key: ChunkKey) -> Result<ChunkContent, GenerateError> {
        if let Some(content) = self.cache.take(key) {
            self.stats.restored += 1;
            return Ok(content);
        }

        if let Some(content) = self.prefetcher.as_mut().and_then(|p| p.take(key)) {
            self.stats.prefetched += 1;
            return Ok(content);
        }

        let content = self.generator.generate(key)?;
        self.stats.generated += 1;
        Ok(content)
    }

    /// Detaches every pending chunk from the scene and moves it to the cache.
    #[profiling::function]
    fn flush(&mut self, center: ChunkKey, scene: &mut S) {
        let drained = self.visibility.drain_pending(center);
        ec_log::trace!("flushing {} chunks around {center}", drained.len());

        for (key, handle) in drained {
            let content = scene.detach(handle);
            debug_assert_eq!(content.key(), key);

            if let Some(evicted) = self.cache.put(key, content) {
                ec_log::trace!("evicted chunk {} from the cache", evicted.key());
                self.stats.evicted += 1;
            }
            self.stats.cached += 1;
        }

        self.stats.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use ec_core::{BuildingPrototype, GroundCell, GroundMaterial, PrototypePool};
    use ec_rng::{DefaultRng, Rng};
    use ec_worldgen_city::{generate_chunk, CityGenerator, CityLayout};

    /// Produces tiny chunks and counts how many it produced.
    #[derive(Default)]
    struct CountingGenerator {
        count: AtomicUsize,
    }

    impl ChunkGenerator for CountingGenerator {
        fn generate(&self, key: ChunkKey) -> Result<ChunkContent, GenerateError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            let mut content = ChunkContent::new(key);
            content.ground.push(GroundCell {
                center: Vec3::ZERO,
                side: 1.0,
                material: GroundMaterial::Grass,
            });
            Ok(content)
        }
    }

    /// Always generates with an empty prototype list.
    struct EmptyPoolGenerator;

    impl ChunkGenerator for EmptyPoolGenerator {
        fn generate(&self, key: ChunkKey) -> Result<ChunkContent, GenerateError> {
            let mut rng = DefaultRng::from_seed(0);
            generate_chunk(key, &[], &CityLayout::default(), &mut rng)
        }
    }

    fn controller(
        config: StreamingConfig,
    ) -> (StreamingController<ArenaScene>, Arc<CountingGenerator>) {
        let generator = Arc::new(CountingGenerator::default());
        let controller = StreamingController::new(config, generator.clone());
        (controller, generator)
    }

    fn keys(xs: impl Clone + IntoIterator<Item = i32>, zs: &[i32]) -> Vec<ChunkKey> {
        let mut ret: Vec<_> = zs
            .iter()
            .flat_map(|&z| xs.clone().into_iter().map(move |x| ChunkKey::new(x, z)))
            .collect();
        ret.sort_unstable();
        ret
    }

    fn sorted(iter: impl Iterator<Item = ChunkKey>) -> Vec<ChunkKey> {
        let mut ret: Vec<_> = iter.collect();
        ret.sort_unstable();
        ret
    }

    #[test]
    fn scenario_initial_neighborhood() {
        let (mut controller, generator) = controller(StreamingConfig::default());
        let mut scene = ArenaScene::new();

        let changes = controller.update(Vec3::ZERO, &mut scene).unwrap();
        assert_eq!(changes, SceneChanges::ATTACHED);
        assert_eq!(controller.center(), Some(ChunkKey::ORIGIN));
        assert_eq!(
            sorted(controller.visibility().keys()),
            keys(-1..=1, &[-1, 0, 1])
        );
        assert_eq!(scene.node_count(), 9);
        assert_eq!(generator.count.load(Ordering::SeqCst), 9);

        // Nothing changes while the viewpoint stays in the same chunk.
        let changes = controller
            .update(Vec3::new(70.0, 5.0, 20.0), &mut scene)
            .unwrap();
        assert!(changes.is_empty());
        assert_eq!(controller.center(), Some(ChunkKey::ORIGIN));
        assert_eq!(scene.node_count(), 9);
        assert_eq!(generator.count.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn scenario_no_flush_below_threshold() {
        let (mut controller, _) = controller(StreamingConfig::default());
        let mut scene = ArenaScene::new();

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        let changes = controller
            .update(Vec3::new(300.0, 0.0, 0.0), &mut scene)
            .unwrap();

        assert_eq!(changes, SceneChanges::ATTACHED);
        assert_eq!(controller.center(), Some(ChunkKey::new(2, 0)));
        assert_eq!(
            sorted(controller.visibility().pending()),
            keys(-1..=0, &[-1, 0, 1])
        );

        // The pending chunks remain attached.
        assert_eq!(controller.visibility().len(), 15);
        assert_eq!(scene.node_count(), 15);
        assert!(controller.cache().is_empty());
        assert_eq!(controller.stats().flushes, 0);
    }

    #[test]
    fn scenario_flush_at_threshold() {
        let (mut controller, _) = controller(StreamingConfig::default());
        let mut scene = ArenaScene::new();

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        controller
            .update(Vec3::new(300.0, 0.0, 0.0), &mut scene)
            .unwrap();

        // Moving to (2, 1) makes the row z = -1 stale as well.
        let mut expected = keys(-1..=0, &[-1, 0, 1]);
        expected.extend(keys(1..=3, &[-1]));
        expected.sort_unstable();

        let changes = controller
            .update(Vec3::new(300.0, 0.0, 150.0), &mut scene)
            .unwrap();
        assert_eq!(changes, SceneChanges::ATTACHED | SceneChanges::DETACHED);

        assert_eq!(sorted(controller.cache().keys()), expected);
        assert_eq!(controller.visibility().pending_len(), 0);
        assert_eq!(
            sorted(controller.visibility().keys()),
            keys(1..=3, &[0, 1, 2])
        );
        assert_eq!(scene.node_count(), 9);
        assert_eq!(controller.stats().flushes, 1);
        assert_eq!(controller.stats().cached, 9);
    }

    #[test]
    fn flush_of_exactly_the_threshold() {
        let config = StreamingConfig {
            flush_threshold: 6,
            ..StreamingConfig::default()
        };
        let (mut controller, _) = controller(config);
        let mut scene = ArenaScene::new();

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        let changes = controller
            .update(Vec3::new(300.0, 0.0, 0.0), &mut scene)
            .unwrap();

        assert_eq!(changes, SceneChanges::ATTACHED | SceneChanges::DETACHED);
        assert_eq!(controller.visibility().pending_len(), 0);
        assert_eq!(controller.cache().len(), 6);
        assert_eq!(sorted(controller.cache().keys()), keys(-1..=0, &[-1, 0, 1]));
        assert_eq!(scene.node_count(), 9);
    }

    #[test]
    fn edge_of_the_key_range_is_stable() {
        let (mut controller, _) = controller(StreamingConfig::default());
        let mut scene = ArenaScene::new();
        let viewpoint = Vec3::new(150.0 * 2f32.powi(31), 0.0, 0.0);

        for _ in 0..3 {
            controller.update(viewpoint, &mut scene).unwrap();
            assert_eq!(controller.center(), Some(ChunkKey::new(i32::MAX, 0)));
            assert_eq!(controller.visibility().len(), 9);
            assert_eq!(controller.visibility().pending_len(), 0);
        }
        assert!(controller.visibility().is_visible(ChunkKey::new(i32::MIN, 0)));
    }

    #[test]
    fn scenario_empty_prototype_pool() {
        let mut controller =
            StreamingController::new(StreamingConfig::default(), Arc::new(EmptyPoolGenerator));
        let mut scene = ArenaScene::new();

        let err = controller.update(Vec3::ZERO, &mut scene).unwrap_err();
        assert_eq!(err, StreamError::Generate(GenerateError::EmptyPrototypePool));
        assert_eq!(controller.center(), None);
        assert_eq!(scene.node_count(), 0);
        assert!(controller.visibility().is_empty());
    }

    #[test]
    fn non_finite_viewpoint_is_rejected() {
        let (mut controller, generator) = controller(StreamingConfig::default());
        let mut scene = ArenaScene::new();

        let err = controller
            .update(Vec3::new(f32::NAN, 0.0, 0.0), &mut scene)
            .unwrap_err();
        assert_eq!(err, StreamError::NonFiniteViewpoint);
        assert_eq!(controller.center(), None);
        assert_eq!(generator.count.load(Ordering::SeqCst), 0);
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn cached_chunks_are_restored_without_regeneration() {
        let pool = PrototypePool::new(vec![BuildingPrototype::new(
            "tower",
            Vec3::new(800.0, 3000.0, 800.0),
            Vec3::new(0.0, 15.0, 0.0),
        )])
        .unwrap();
        let generator = Arc::new(CityGenerator::new(7, pool, CityLayout::default()));
        let mut controller = StreamingController::new(StreamingConfig::default(), generator);
        let mut scene = ArenaScene::new();

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        let origin_id = scene
            .get(controller.visibility().handle(ChunkKey::ORIGIN).unwrap())
            .unwrap()
            .id();

        // Move far enough for the origin chunk to be flushed.
        controller
            .update(Vec3::new(450.0, 0.0, 0.0), &mut scene)
            .unwrap();
        assert!(controller.cache().has(ChunkKey::ORIGIN));
        assert!(!controller.visibility().is_visible(ChunkKey::ORIGIN));

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        let restored_id = scene
            .get(controller.visibility().handle(ChunkKey::ORIGIN).unwrap())
            .unwrap()
            .id();

        assert_eq!(origin_id, restored_id);
        assert!(!controller.cache().has(ChunkKey::ORIGIN));
        assert_eq!(controller.stats().restored, 9);
        assert_eq!(controller.stats().generated, 18);
    }

    #[test]
    fn pending_chunks_that_come_back_are_kept() {
        let (mut controller, generator) = controller(StreamingConfig::default());
        let mut scene = ArenaScene::new();

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        controller
            .update(Vec3::new(160.0, 0.0, 0.0), &mut scene)
            .unwrap();
        assert_eq!(controller.visibility().pending_len(), 3);

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        assert_eq!(controller.visibility().pending_len(), 3);
        assert!(!controller.visibility().is_pending(ChunkKey::new(-1, 0)));
        assert!(controller.visibility().is_pending(ChunkKey::new(2, 0)));
        assert_eq!(generator.count.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn invariants_hold_along_a_walk() {
        let config = StreamingConfig::default();
        let (mut controller, _) = controller(config.clone());
        let mut scene = ArenaScene::new();
        let mut rng = DefaultRng::from_seed(42);
        let mut pos = Vec3::ZERO;

        for _ in 0..200 {
            let step = Vec3::new(
                rng.next_f64_01() as f32 * 200.0 - 100.0,
                0.0,
                rng.next_f64_01() as f32 * 200.0 - 100.0,
            );
            pos += step;
            controller.update(pos, &mut scene).unwrap();

            let center = ChunkKey::from_world_pos(pos, config.chunk_size);
            for key in center.neighborhood(config.view_radius) {
                assert!(controller.visibility().is_visible(key));
            }
            for key in controller.cache().keys() {
                assert!(!controller.visibility().is_visible(key));
            }
            for key in controller.visibility().pending() {
                assert!(controller.visibility().is_visible(key));
            }
            assert!(controller.cache().len() <= config.cache_capacity);
            assert!(controller.visibility().pending_len() < config.flush_threshold);
            assert_eq!(scene.node_count(), controller.visibility().len());
        }
    }

    #[test]
    fn prefetched_chunks_are_attached_without_inline_generation() {
        let config = StreamingConfig {
            prefetch_workers: 2,
            ..StreamingConfig::default()
        };
        let (mut controller, _) = controller(config);
        let mut scene = ArenaScene::new();

        controller.update(Vec3::ZERO, &mut scene).unwrap();
        assert_eq!(controller.stats().generated, 9);

        let deadline = Instant::now() + Duration::from_secs(10);
        while controller.prefetcher().map_or(0, Prefetcher::ready_len) < 16 {
            assert!(Instant::now() < deadline, "prefetching did not finish in time");
            std::thread::sleep(Duration::from_millis(1));
            controller.collect_prefetched();
        }

        controller
            .update(Vec3::new(160.0, 0.0, 0.0), &mut scene)
            .unwrap();
        assert_eq!(controller.stats().generated, 9);
        assert_eq!(controller.stats().prefetched, 3);
        assert!(controller.visibility().is_visible(ChunkKey::new(2, 0)));
    }

    #[test]
    fn default_config_is_valid() {
        let config = StreamingConfig::default();
        assert_eq!(config.chunk_size, 150.0);
        assert_eq!(config.view_radius, 1);
        assert_eq!(config.cache_capacity, 10);
        assert_eq!(config.flush_threshold, 8);
        assert!(config.validate().is_ok());

        let bad = StreamingConfig {
            chunk_size: -1.0,
            ..config
        };
        assert!(bad.validate().is_err());
    }
}
