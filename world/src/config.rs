//! Construction settings for grids.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::GridError;

/// Bounding volume and cell layout used to build a grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// World-space center of the bounding volume.
    pub center: Vec3,
    /// Full extents of the bounding volume.
    pub size: Vec3,
    /// Side length of a cubic cell in world units.
    pub cell_size: f32,
    /// Highest layer index. The grid holds `y_axis_max + 1` layers.
    pub y_axis_max: i32,
    /// Initial navigability of every constructed cell.
    #[serde(default = "default_navigable")]
    pub navigable: bool,
}

fn default_navigable() -> bool {
    true
}

impl GridSettings {
    /// Creates settings for a navigable grid.
    #[must_use]
    pub const fn new(center: Vec3, size: Vec3, cell_size: f32, y_axis_max: i32) -> Self {
        Self {
            center,
            size,
            cell_size,
            y_axis_max,
            navigable: true,
        }
    }

    /// Overrides the navigability assigned to newly created cells.
    #[must_use]
    pub const fn with_navigable(mut self, navigable: bool) -> Self {
        self.navigable = navigable;
        self
    }

    /// Settings for a grid whose bottom-left corner sits at the world origin.
    #[must_use]
    pub fn anchored_at_origin(columns: u32, rows: u32, layers: u32, cell_size: f32) -> Self {
        let size = Vec3::new(
            columns as f32 * cell_size,
            layers as f32 * cell_size,
            rows as f32 * cell_size,
        );
        let center = Vec3::new(size.x / 2.0, 0.0, size.z / 2.0);
        let y_axis_max = i32::try_from(layers).unwrap_or(i32::MAX).saturating_sub(1);
        Self::new(center, size, cell_size, y_axis_max)
    }

    pub(crate) fn validate(&self) -> Result<(), GridError> {
        if self.y_axis_max < 0 {
            return Err(GridError::NegativeLayerMax(self.y_axis_max));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(GridError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }
}

/// Parameters for building cells by casting rays down onto a surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Creates a cell for every surface a ray passes through instead of only
    /// the first, allowing cells to stack above one another.
    pub cast_through_all: bool,
    /// Height above the grid origin where rays start.
    pub start_height: f32,
    /// Lowest height a ray travels to before giving up.
    pub lowest_height: f32,
}

impl ProjectionSettings {
    /// Length of each downward ray.
    #[must_use]
    pub fn ray_length(&self) -> f32 {
        self.start_height - self.lowest_height
    }
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            cast_through_all: false,
            start_height: 100.0,
            lowest_height: -100.0,
        }
    }
}
