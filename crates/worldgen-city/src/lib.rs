//! The city world generator.
//!
//! Chunks are covered by a regular grid of cells separated by streets. Every cell gets a ground
//! square and one to four buildings cloned from a shared pool of prototypes.

use std::fmt::Write;

use ec_core::{ChunkContent, ChunkKey, PrototypePool};
use ec_rng::{DefaultRng, FromRng, Mixer, Rng};
use ec_worldgen_core::{ChunkGenerator, GenerateError};

mod cell_gen;
pub use cell_gen::{Corner, GROUND_Y, SHADOW_Y, STREET_Y};

mod chunk_gen;
pub use chunk_gen::*;

mod layout;
pub use layout::*;

/// The hashes used to derive per-chunk seeds from the world seed.
#[derive(FromRng)]
struct Seeds {
    /// Maps a chunk key to the seed of the chunk's random number generator.
    chunk: Mixer<2>,
}

/// The standard [`ChunkGenerator`] implementation.
pub struct CityGenerator {
    /// The seed of the world.
    seed: u64,
    /// Derived from `seed`.
    seeds: Seeds,
    /// The prototypes buildings are cloned from.
    prototypes: PrototypePool,
    /// The layout of the city grid.
    layout: CityLayout,
}

impl CityGenerator {
    /// Creates a new [`CityGenerator`].
    pub fn new(seed: u64, prototypes: PrototypePool, layout: CityLayout) -> Self {
        Self {
            seed,
            seeds: Seeds::from_seed::<DefaultRng>(seed),
            prototypes,
            layout,
        }
    }

    /// The seed of the world.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The layout used to generate chunks.
    #[inline]
    pub fn layout(&self) -> &CityLayout {
        &self.layout
    }

    /// The prototypes buildings are cloned from.
    #[inline]
    pub fn prototypes(&self) -> &PrototypePool {
        &self.prototypes
    }

    /// Returns the seed of the random number generator used for the provided chunk.
    #[inline]
    pub fn chunk_seed(&self, key: ChunkKey) -> u64 {
        self.seeds.chunk.mix_i32([key.x, key.z])
    }
}

impl ChunkGenerator for CityGenerator {
    #[profiling::function]
    fn generate(&self, key: ChunkKey) -> Result<ChunkContent, GenerateError> {
        let mut rng = DefaultRng::from_seed(self.chunk_seed(key));
        generate_chunk(key, &self.prototypes, &self.layout, &mut rng)
    }

    fn debug_info(&self, buf: &mut String) {
        let _ = writeln!(
            buf,
            "City: seed {}, {} prototypes, {}x{} cells of {}",
            self.seed,
            self.prototypes.len(),
            self.layout.grid_size,
            self.layout.grid_size,
            self.layout.cell_size,
        );
    }
}
