use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Vec2, Vec3, Vec3Swizzles};

use crate::{BuildingPrototype, ChunkKey};

/// A process-unique identifier given to every [`ChunkContent`] when it is created.
///
/// Two contents with the same identifier are the same content; regenerating a chunk always
/// produces a new identifier, even if the generated elements are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentId(u64);

impl ContentId {
    /// Allocates a new identifier.
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The material of a [`GroundCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroundMaterial {
    /// Green grass.
    Grass,
    /// Grey stone pavement.
    Stone,
    /// A brown accent tile.
    Accent,
}

impl GroundMaterial {
    /// All the materials.
    pub const ALL: [Self; 3] = [Self::Grass, Self::Stone, Self::Accent];
}

/// A flat square of ground covering one cell of the city grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundCell {
    /// The world-space center of the square.
    pub center: Vec3,
    /// The side length of the square.
    pub side: f32,
    /// The material of the ground.
    pub material: GroundMaterial,
}

/// A flat rectangular piece of street.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSegment {
    /// The world-space center of the rectangle.
    pub center: Vec3,
    /// The extent of the rectangle along the X and Z axes.
    pub size: Vec2,
}

/// A building placed in the world, instanciated from a [`BuildingPrototype`].
#[derive(Debug, Clone)]
pub struct BuildingInstance {
    /// The prototype this building was cloned from.
    pub prototype: BuildingPrototype,
    /// The world-space position of the building.
    pub translation: Vec3,
    /// The uniform scale applied to the prototype.
    pub scale: f32,
}

impl BuildingInstance {
    /// The world-space size of the building's bounding box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.prototype.size() * self.scale
    }

    /// The extent of the building on the ground (X and Z).
    #[inline]
    pub fn footprint(&self) -> Vec2 {
        self.size().xz()
    }
}

/// A flat translucent decal laid under a building.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowDecal {
    /// The world-space center of the decal.
    pub center: Vec3,
    /// The extent of the decal along the X and Z axes.
    pub size: Vec2,
    /// The opacity of the decal, between `0.0` and `1.0`.
    pub opacity: f32,
}

/// The generated content of a single chunk.
///
/// Every element generated for a chunk lives in its [`ChunkContent`], so attaching, detaching,
/// caching or dropping the content always covers the whole chunk.
///
/// A [`ChunkContent`] is not [`Clone`]: at any given time it is owned either by the scene or
/// by the chunk cache.
#[derive(Debug)]
pub struct ChunkContent {
    /// The identity of this content.
    id: ContentId,
    /// The chunk this content was generated for.
    key: ChunkKey,

    /// The ground cells of the chunk.
    pub ground: Vec<GroundCell>,
    /// The street segments of the chunk.
    pub streets: Vec<StreetSegment>,
    /// The buildings of the chunk.
    pub buildings: Vec<BuildingInstance>,
    /// The shadow decals of the chunk, one per building.
    pub shadows: Vec<ShadowDecal>,
}

impl ChunkContent {
    /// Creates a new, empty [`ChunkContent`] for the provided chunk.
    pub fn new(key: ChunkKey) -> Self {
        Self {
            id: ContentId::next(),
            key,
            ground: Vec::new(),
            streets: Vec::new(),
            buildings: Vec::new(),
            shadows: Vec::new(),
        }
    }

    /// The identity of this content.
    #[inline]
    pub fn id(&self) -> ContentId {
        self.id
    }

    /// The chunk this content belongs to.
    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// The total number of elements in the chunk.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.ground.len() + self.streets.len() + self.buildings.len() + self.shadows.len()
    }

    /// Returns whether the chunk has no element at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Returns whether the generated elements are the same as the other content's, regardless
    /// of identity.
    pub fn same_elements(&self, other: &Self) -> bool {
        self.key == other.key
            && self.ground == other.ground
            && self.streets == other.streets
            && self.shadows == other.shadows
            && self.buildings.len() == other.buildings.len()
            && self
                .buildings
                .iter()
                .zip(&other.buildings)
                .all(|(a, b)| {
                    a.prototype.ptr_eq(&b.prototype)
                        && a.translation == b.translation
                        && a.scale == b.scale
                })
    }

    /// Iterates over the horizontal positions of every element of the chunk.
    pub fn element_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        let ground = self.ground.iter().map(|g| g.center.xz());
        let streets = self.streets.iter().map(|s| s.center.xz());
        let buildings = self.buildings.iter().map(|b| b.translation.xz());
        let shadows = self.shadows.iter().map(|s| s.center.xz());
        ground.chain(streets).chain(buildings).chain(shadows)
    }
}
