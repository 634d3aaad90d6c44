use ec_core::{
    BuildingInstance, BuildingPrototype, ChunkContent, GroundCell, ShadowDecal, StreetSegment,
};
use ec_rng::Rng;

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::CityLayout;

/// The height of ground cells.
pub const GROUND_Y: f32 = -0.1;
/// The height of street segments, just above the ground to avoid z-fighting.
pub const STREET_Y: f32 = -0.09;
/// The height of shadow decals, just above the streets.
pub const SHADOW_Y: f32 = -0.08;

/// The corners of a cell where buildings can be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    UpperRight,
    UpperLeft,
    LowerRight,
    LowerLeft,
}

impl Corner {
    /// All the corners, in the order they are filled when a cell is full.
    pub const ALL: [Self; 4] = [
        Self::UpperRight,
        Self::UpperLeft,
        Self::LowerRight,
        Self::LowerLeft,
    ];

    /// The position of the corner relative to the cell's minimum corner.
    pub fn offset(self, cell_size: f32, inset: f32) -> Vec2 {
        let near = inset;
        let far = cell_size - inset;

        match self {
            Self::UpperRight => Vec2::new(far, near),
            Self::UpperLeft => Vec2::new(near, near),
            Self::LowerRight => Vec2::new(far, far),
            Self::LowerLeft => Vec2::new(near, far),
        }
    }
}

/// Returns how many buildings a cell should contain, between 1 and 4.
#[inline]
pub fn building_count(rng: &mut impl Rng) -> usize {
    rng.next_below(4) as usize + 1
}

/// Picks the corners of a cell that will receive `count` buildings.
///
/// A full cell gets its corners in the order of [`Corner::ALL`]. Otherwise, corners are drawn
/// uniformly without replacement, so no two buildings share a corner.
pub fn pick_corners(count: usize, rng: &mut impl Rng) -> SmallVec<[Corner; 4]> {
    debug_assert!((1..=4).contains(&count));

    if count >= Corner::ALL.len() {
        return SmallVec::from_buf(Corner::ALL);
    }

    let mut remaining = SmallVec::<[Corner; 4]>::from_buf(Corner::ALL);
    let mut ret = SmallVec::new();
    for _ in 0..count {
        let index = rng.next_below(remaining.len() as u32) as usize;
        ret.push(remaining.remove(index));
    }
    ret
}

/// Places a building cloned from `prototype` at the provided horizontal position, along with
/// its shadow decal.
pub fn place_building(
    content: &mut ChunkContent,
    prototype: &BuildingPrototype,
    position: Vec2,
    layout: &CityLayout,
) {
    let building = BuildingInstance {
        prototype: prototype.clone(),
        // The prototype keeps its own vertical offset.
        translation: Vec3::new(position.x, prototype.origin().y, position.y),
        scale: layout.building_scale,
    };

    content.shadows.push(ShadowDecal {
        center: Vec3::new(position.x, SHADOW_Y, position.y),
        size: building.footprint(),
        opacity: layout.shadow_opacity,
    });
    content.buildings.push(building);
}

/// Generates the ground, streets and buildings of one cell of the city grid.
///
/// `origin` is the world-space position of the minimum corner of the cell.
pub fn generate_cell(
    content: &mut ChunkContent,
    origin: Vec2,
    prototypes: &[BuildingPrototype],
    layout: &CityLayout,
    rng: &mut impl Rng,
) {
    let cell = layout.cell_size;
    let half = cell / 2.0;
    let center = origin + Vec2::splat(half);

    content.ground.push(GroundCell {
        center: Vec3::new(center.x, GROUND_Y, center.y),
        side: cell - layout.street_width / 2.0,
        material: layout.pick_ground(rng),
    });

    // One street along the minimum X edge, and one along the minimum Z edge. The neighbouring
    // cells provide the two others.
    content.streets.push(StreetSegment {
        center: Vec3::new(origin.x, STREET_Y, center.y),
        size: Vec2::new(layout.street_width, cell),
    });
    content.streets.push(StreetSegment {
        center: Vec3::new(center.x, STREET_Y, origin.y),
        size: Vec2::new(cell, layout.street_width),
    });

    let inset = layout.corner_inset();
    for corner in pick_corners(building_count(rng), rng) {
        let prototype = &prototypes[rng.next_below(prototypes.len() as u32) as usize];
        place_building(content, prototype, origin + corner.offset(cell, inset), layout);
    }
}
