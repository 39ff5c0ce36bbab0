//! Builds cells by casting rays down onto an external surface.

use std::collections::HashMap;

use glam::Vec3;
use plinth_core::{CellCoord, Direction, RampDescriptor};

use crate::{cell::Cell, GridError, ProjectionSettings, RampError};

/// Identifies the surface a ray hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u32);

impl SurfaceId {
    /// Creates a new surface identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Result of a downward ray striking a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    /// World-space point where the ray met the surface.
    pub point: Vec3,
    /// Unit normal of the surface at the hit point.
    pub normal: Vec3,
    /// Surface that was struck.
    pub surface: SurfaceId,
}

/// Capability for casting vertical rays into the world.
pub trait SurfaceProbe {
    /// Nearest surface below `origin` within `max_distance`.
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<SurfaceHit>;

    /// Every surface below `origin` within `max_distance`, in any order.
    fn cast_down_all(&self, origin: Vec3, max_distance: f32) -> Vec<SurfaceHit>;
}

/// Floors `value`, snapping values within rounding noise of an integer onto it.
pub(crate) fn floor_with_threshold(value: f32) -> i32 {
    const THRESHOLD: f32 = 1e-4;
    let nearest = value.round();
    if (value - nearest).abs() < THRESHOLD {
        nearest as i32
    } else {
        value.floor() as i32
    }
}

/// Rounds to one decimal place.
pub(crate) fn round_tenths(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

fn round_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Classifies a sloped surface hit into a ramp on `layer`.
///
/// The surface is probed again a quarter cell toward +X and then +Z. A higher
/// surface on +X makes an east-rising ramp, a lower one west. The Z axis
/// resolves north and south the same way.
pub fn detect_ramp(
    hit: &SurfaceHit,
    ray_origin: Vec3,
    cell_size: f32,
    layer: i32,
    probe: &dyn SurfaceProbe,
) -> Result<RampDescriptor, RampError> {
    if hit.normal.abs_diff_eq(Vec3::Y, 1e-5) {
        return Err(RampError::FlatSurface);
    }

    let step = cell_size / 4.0;
    let probe_height = hit.point.y.floor() + cell_size;
    let reference = round_tenths(hit.point.y);
    let axes = [
        (Vec3::new(step, 0.0, 0.0), Direction::East, Direction::West),
        (Vec3::new(0.0, 0.0, step), Direction::North, Direction::South),
    ];

    for (offset, rising, falling) in axes {
        let mut origin = ray_origin + offset;
        origin.y = probe_height;
        let Some(sample) = probe
            .cast_down_all(origin, 2.0 * cell_size)
            .into_iter()
            .find(|sample| sample.surface == hit.surface)
        else {
            continue;
        };

        let height = round_tenths(sample.point.y);
        if height > reference {
            return Ok(RampDescriptor::new(rising, layer));
        }
        if height < reference {
            return Ok(RampDescriptor::new(falling, layer));
        }
    }

    Err(RampError::Indeterminate(hit.point))
}

/// Lattice describing where projected cells may appear.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProjectionLattice {
    pub(crate) origin: Vec3,
    pub(crate) cell_size: f32,
    pub(crate) columns: i32,
    pub(crate) rows: i32,
}

/// Casts one ray per column and row and creates a cell for each surface found.
pub(crate) fn project_cells<F>(
    lattice: ProjectionLattice,
    settings: &ProjectionSettings,
    probe: &dyn SurfaceProbe,
    factory: &mut F,
) -> Result<HashMap<CellCoord, Cell>, GridError>
where
    F: FnMut(CellCoord, Vec3, f32) -> Cell,
{
    let size = lattice.cell_size;
    let half = size / 2.0;
    let mut cells = HashMap::new();

    for column in 0..lattice.columns {
        for row in 0..lattice.rows {
            let ray_origin = Vec3::new(
                column as f32 * size + lattice.origin.x + half,
                settings.start_height + lattice.origin.y,
                row as f32 * size + lattice.origin.z + half,
            );

            let hits = if settings.cast_through_all {
                surfaces_below(ray_origin, settings, probe, size)
            } else {
                probe
                    .cast_down(ray_origin, settings.ray_length())
                    .into_iter()
                    .collect()
            };

            for hit in hits {
                let layer = floor_with_threshold((hit.point.y - lattice.origin.y) / size);
                let coord = CellCoord::new(column, layer, row);
                let origin = lattice.origin
                    + Vec3::new(column as f32 * size, layer as f32 * size, row as f32 * size);

                let mut cell = factory(coord, origin, size);
                if cell.coord() != coord {
                    tracing::warn!(?coord, produced = ?cell.coord(), "cell factory changed the coordinate, skipping");
                    continue;
                }
                if !hit.normal.abs_diff_eq(Vec3::Y, 1e-5) {
                    let ramp = detect_ramp(&hit, ray_origin, size, layer, probe)?;
                    cell = cell.with_ramp(ramp);
                }
                if cells.insert(coord, cell).is_some() {
                    tracing::debug!(?coord, "projected surface replaced an earlier cell");
                }
            }
        }
    }

    Ok(cells)
}

/// Every usable surface below `ray_origin`, highest first.
///
/// A surface whose top lies within one cell of the previous surface is the
/// underside of occupied space and does not produce a cell.
fn surfaces_below(
    ray_origin: Vec3,
    settings: &ProjectionSettings,
    probe: &dyn SurfaceProbe,
    cell_size: f32,
) -> Vec<SurfaceHit> {
    let mut hits = probe.cast_down_all(ray_origin, settings.ray_length());
    hits.sort_by(|a, b| b.point.y.total_cmp(&a.point.y));

    let mut last_surface = ray_origin.y.floor() + cell_size;
    let mut usable = Vec::with_capacity(hits.len());
    for hit in hits {
        let top = floor_with_threshold(hit.point.y) as f32;
        let blocked = last_surface - top <= cell_size;
        last_surface = round_hundredths(hit.point.y).ceil();
        if !blocked {
            usable.push(hit);
        }
    }
    usable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_floor_absorbs_rounding_noise() {
        assert_eq!(floor_with_threshold(1.999_99), 2);
        assert_eq!(floor_with_threshold(1.5), 1);
        assert_eq!(floor_with_threshold(-0.5), -1);
        assert_eq!(floor_with_threshold(3.0), 3);
    }

    #[test]
    fn tenths_rounding() {
        assert!((round_tenths(0.74) - 0.7).abs() < 1e-6);
        assert!((round_tenths(0.76) - 0.8).abs() < 1e-6);
    }
}
