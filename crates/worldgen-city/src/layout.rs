use std::fmt;

use ec_core::GroundMaterial;
use ec_rng::Rng;

/// The dimensions of the city grid laid out in every chunk.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CityLayout {
    /// The number of cells along each side of a chunk.
    pub grid_size: u32,
    /// The side length of a cell, in world units.
    pub cell_size: f32,
    /// The width of the streets running between cells.
    pub street_width: f32,
    /// The uniform scale applied to building prototypes.
    ///
    /// Prototypes are authored in centimeters, hence the `0.01` default.
    pub building_scale: f32,
    /// The opacity of the shadow decals laid under buildings.
    pub shadow_opacity: f32,
    /// The relative weights of the ground materials, in the order of [`GroundMaterial::ALL`].
    pub ground_weights: [u32; 3],
}

impl Default for CityLayout {
    fn default() -> Self {
        Self {
            grid_size: 10,
            cell_size: 15.0,
            street_width: 2.0,
            building_scale: 0.01,
            shadow_opacity: 0.35,
            // Grass 50%, stone 25%, accent 25%.
            ground_weights: [2, 1, 1],
        }
    }
}

/// The error returned by [`CityLayout::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLayout(pub &'static str);

impl fmt::Display for InvalidLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid city layout: {}", self.0)
    }
}

impl std::error::Error for InvalidLayout {}

impl CityLayout {
    /// The side length of the area covered by the grid, which must match the chunk size.
    #[inline]
    pub fn chunk_size(&self) -> f32 {
        self.grid_size as f32 * self.cell_size
    }

    /// The distance between the edges of a cell and the buildings placed in its corners.
    #[inline]
    pub fn corner_inset(&self) -> f32 {
        self.street_width * 2.0
    }

    /// Makes sure that the layout produces sensible geometry.
    pub fn validate(&self) -> Result<(), InvalidLayout> {
        if self.grid_size == 0 {
            return Err(InvalidLayout("grid_size must be at least 1"));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(InvalidLayout("cell_size must be a positive number"));
        }
        if !(self.street_width.is_finite() && self.street_width >= 0.0) {
            return Err(InvalidLayout("street_width must not be negative"));
        }
        if self.corner_inset() * 2.0 > self.cell_size {
            return Err(InvalidLayout("streets are too wide for the cells"));
        }
        if !(self.building_scale.is_finite() && self.building_scale > 0.0) {
            return Err(InvalidLayout("building_scale must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.shadow_opacity) {
            return Err(InvalidLayout("shadow_opacity must be between 0 and 1"));
        }
        if self.ground_weights.iter().all(|&w| w == 0) {
            return Err(InvalidLayout("at least one ground weight must be non-zero"));
        }
        Ok(())
    }

    /// Picks a ground material according to the configured weights.
    pub fn pick_ground(&self, rng: &mut impl Rng) -> GroundMaterial {
        let total: u32 = self.ground_weights.iter().sum();
        let mut roll = rng.next_below(total);

        for (material, &weight) in GroundMaterial::ALL.iter().zip(&self.ground_weights) {
            if roll < weight {
                return *material;
            }
            roll -= weight;
        }

        // Only reachable when every weight is zero.
        GroundMaterial::Grass
    }
}
