use std::fmt;
use std::hash::Hash;

use glam::{IVec2, Vec2, Vec3};

/// The key of a chunk: its position on the horizontal chunk grid.
///
/// Chunks extend vertically without bound, so only the X and Z coordinates are part of the key.
/// The domain is the whole `i32` plane; no bounds are checked anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChunkKey {
    /// The X coordinate of the chunk.
    pub x: i32,
    /// The Z coordinate of the chunk.
    pub z: i32,
}

impl ChunkKey {
    /// The key of the chunk that contains the world origin.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new [`ChunkKey`] from the provided coordinates.
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the key of the chunk that contains the provided world-space position.
    ///
    /// The vertical coordinate is ignored. Chunks are `chunk_size` world units wide and the chunk
    /// `(0, 0)` spans `[0, chunk_size)` on both axes, so `x = floor(pos.x / chunk_size)` and
    /// `z = floor(pos.z / chunk_size)`.
    ///
    /// # Remarks
    ///
    /// Coordinates that do not fit in an `i32` saturate. The result is unspecified for
    /// non-finite positions; callers are expected to reject those beforehand.
    #[inline]
    pub fn from_world_pos(pos: Vec3, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            z: (pos.z / chunk_size).floor() as i32,
        }
    }

    /// Returns the world-space X and Z coordinates of the minimum corner of the chunk.
    #[inline]
    pub fn origin(self, chunk_size: f32) -> Vec2 {
        self.as_ivec2().as_vec2() * chunk_size
    }

    /// Returns the key as an [`IVec2`].
    #[inline]
    pub const fn as_ivec2(self) -> IVec2 {
        IVec2::new(self.x, self.z)
    }

    /// Returns the Chebyshev (chessboard) distance between two keys.
    ///
    /// Keys wrap around at the edges of the `i32` range, like [`ChunkKey::neighborhood`], so
    /// `i32::MAX` and `i32::MIN` are adjacent.
    #[inline]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.wrapping_sub(other.x).unsigned_abs();
        let dz = self.z.wrapping_sub(other.z).unsigned_abs();
        dx.max(dz)
    }

    /// Returns an iterator over the keys at a Chebyshev distance of at most `radius` from this
    /// one, including itself.
    ///
    /// The keys are yielded row by row (increasing Z, then increasing X within a row).
    pub fn neighborhood(self, radius: u32) -> impl Iterator<Item = Self> {
        let r = radius as i32;
        (-r..=r).flat_map(move |dz| (-r..=r).map(move |dx| self + IVec2::new(dx, dz)))
    }

    /// Returns an iterator over the keys at a Chebyshev distance of exactly `radius` from this
    /// one.
    pub fn ring(self, radius: u32) -> impl Iterator<Item = Self> {
        self.neighborhood(radius)
            .filter(move |&key| key.chebyshev_distance(self) == radius)
    }
}

impl Hash for ChunkKey {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64((self.x as u32 as u64) << 32 | self.z as u32 as u64);
    }
}

impl std::ops::Add<IVec2> for ChunkKey {
    type Output = Self;

    #[inline]
    fn add(self, rhs: IVec2) -> Self::Output {
        Self {
            x: self.x.wrapping_add(rhs.x),
            z: self.z.wrapping_add(rhs.y),
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
