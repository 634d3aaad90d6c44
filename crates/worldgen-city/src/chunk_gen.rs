use ec_core::{BuildingPrototype, ChunkContent, ChunkKey};
use ec_rng::Rng;
use ec_worldgen_core::GenerateError;

use glam::Vec2;

use crate::cell_gen::generate_cell;
use crate::CityLayout;

/// Generates the content of the chunk with the provided key.
///
/// The chunk is split in `grid_size × grid_size` cells, starting at the chunk's origin. Each cell
/// receives a ground square, two street segments and between one and four buildings cloned from
/// `prototypes`, each with a shadow decal.
///
/// The structure of the chunk only depends on `layout`; `rng` decides the ground materials and
/// the number, placement and kind of buildings.
///
/// # Errors
///
/// Fails with [`GenerateError::EmptyPrototypePool`] when `prototypes` is empty, before anything
/// is generated.
pub fn generate_chunk(
    key: ChunkKey,
    prototypes: &[BuildingPrototype],
    layout: &CityLayout,
    rng: &mut impl Rng,
) -> Result<ChunkContent, GenerateError> {
    if prototypes.is_empty() {
        return Err(GenerateError::EmptyPrototypePool);
    }

    let grid = layout.grid_size as usize;
    let cells = grid * grid;

    let mut content = ChunkContent::new(key);
    content.ground.reserve_exact(cells);
    content.streets.reserve_exact(cells * 2);
    content.buildings.reserve(cells * 4);
    content.shadows.reserve(cells * 4);

    let origin = key.origin(layout.chunk_size());
    for x in 0..layout.grid_size {
        for z in 0..layout.grid_size {
            let cell_origin = origin + Vec2::new(x as f32, z as f32) * layout.cell_size;
            generate_cell(&mut content, cell_origin, prototypes, layout, rng);
        }
    }

    Ok(content)
}
