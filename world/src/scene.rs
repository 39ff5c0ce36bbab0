//! Analytic surface scene that answers downward probes without a physics engine.

use glam::{Vec2, Vec3};
use plinth_core::Direction;
use serde::{Deserialize, Serialize};

use crate::projection::{SurfaceHit, SurfaceId, SurfaceProbe};

/// Axis-aligned horizontal footprint of a surface, half-open on the max side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Minimum X and Z corner.
    pub min: Vec2,
    /// Maximum X and Z corner.
    pub max: Vec2,
}

impl Footprint {
    /// Creates a footprint from its X and Z ranges.
    #[must_use]
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_z),
            max: Vec2::new(max_x, max_z),
        }
    }

    fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x < self.max.x && z >= self.min.y && z < self.max.y
    }
}

/// Shape of a surface in a [`SurfaceScene`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceShape {
    /// Flat horizontal plane at `height`.
    Slab {
        /// Horizontal extent.
        footprint: Footprint,
        /// Height of the plane.
        height: f32,
    },
    /// Plane rising linearly by `rise` toward `upper` across its footprint.
    Ramp {
        /// Horizontal extent.
        footprint: Footprint,
        /// Height at the low edge.
        base: f32,
        /// Height gained between the low and high edges.
        rise: f32,
        /// Direction of the high edge.
        upper: Direction,
    },
}

impl SurfaceShape {
    fn footprint(&self) -> &Footprint {
        match self {
            Self::Slab { footprint, .. } | Self::Ramp { footprint, .. } => footprint,
        }
    }

    /// Height and normal of the surface above the horizontal point, if any.
    fn sample(&self, x: f32, z: f32) -> Option<(f32, Vec3)> {
        if !self.footprint().contains(x, z) {
            return None;
        }
        match *self {
            Self::Slab { height, .. } => Some((height, Vec3::Y)),
            Self::Ramp {
                footprint,
                base,
                rise,
                upper,
            } => {
                let width = footprint.max.x - footprint.min.x;
                let depth = footprint.max.y - footprint.min.y;
                let (fraction, gradient) = match upper {
                    Direction::East => ((x - footprint.min.x) / width, Vec2::new(rise / width, 0.0)),
                    Direction::West => ((footprint.max.x - x) / width, Vec2::new(-rise / width, 0.0)),
                    Direction::North => ((z - footprint.min.y) / depth, Vec2::new(0.0, rise / depth)),
                    Direction::South => ((footprint.max.y - z) / depth, Vec2::new(0.0, -rise / depth)),
                };
                let normal = Vec3::new(-gradient.x, 1.0, -gradient.y).normalize();
                Some((base + rise * fraction, normal))
            }
        }
    }
}

/// Collection of analytic surfaces implementing [`SurfaceProbe`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceScene {
    surfaces: Vec<SurfaceShape>,
}

impl SurfaceScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface, returning the identifier probes will report for it.
    pub fn add(&mut self, shape: SurfaceShape) -> SurfaceId {
        self.surfaces.push(shape);
        SurfaceId::new(u32::try_from(self.surfaces.len() - 1).unwrap_or(u32::MAX))
    }

    /// Adds a flat slab covering the footprint at `height`.
    #[must_use]
    pub fn with_slab(mut self, footprint: Footprint, height: f32) -> Self {
        let _surface = self.add(SurfaceShape::Slab { footprint, height });
        self
    }

    /// Adds a ramp covering the footprint, rising by `rise` toward `upper`.
    #[must_use]
    pub fn with_ramp(mut self, footprint: Footprint, base: f32, rise: f32, upper: Direction) -> Self {
        let _surface = self.add(SurfaceShape::Ramp {
            footprint,
            base,
            rise,
            upper,
        });
        self
    }

    /// Surfaces contained in the scene.
    #[must_use]
    pub fn surfaces(&self) -> &[SurfaceShape] {
        &self.surfaces
    }
}

impl SurfaceProbe for SurfaceScene {
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        self.cast_down_all(origin, max_distance)
            .into_iter()
            .max_by(|a, b| a.point.y.total_cmp(&b.point.y))
    }

    fn cast_down_all(&self, origin: Vec3, max_distance: f32) -> Vec<SurfaceHit> {
        self.surfaces
            .iter()
            .enumerate()
            .filter_map(|(index, shape)| {
                let (height, normal) = shape.sample(origin.x, origin.z)?;
                let drop = origin.y - height;
                if !(0.0..=max_distance).contains(&drop) {
                    return None;
                }
                Some(SurfaceHit {
                    point: Vec3::new(origin.x, height, origin.z),
                    normal,
                    surface: SurfaceId::new(u32::try_from(index).ok()?),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_hit_is_the_highest_surface() {
        let scene = SurfaceScene::new()
            .with_slab(Footprint::new(0.0, 0.0, 4.0, 4.0), 0.0)
            .with_slab(Footprint::new(0.0, 0.0, 4.0, 4.0), 3.0);
        let hit = scene
            .cast_down(Vec3::new(1.5, 10.0, 1.5), 20.0)
            .expect("surface below");
        assert_eq!(hit.surface, SurfaceId::new(1));
        assert_eq!(scene.cast_down_all(Vec3::new(1.5, 10.0, 1.5), 20.0).len(), 2);
    }

    #[test]
    fn rays_stop_at_max_distance() {
        let scene = SurfaceScene::new().with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 0.0);
        assert!(scene.cast_down(Vec3::new(0.5, 10.0, 0.5), 5.0).is_none());
        assert!(scene.cast_down(Vec3::new(1.5, 10.0, 0.5), 20.0).is_none());
    }

    #[test]
    fn ramp_height_interpolates_toward_upper_edge() {
        let scene = SurfaceScene::new().with_ramp(
            Footprint::new(0.0, 0.0, 2.0, 1.0),
            1.0,
            2.0,
            Direction::West,
        );
        let hit = scene
            .cast_down(Vec3::new(0.5, 10.0, 0.5), 20.0)
            .expect("ramp below");
        assert!((hit.point.y - 2.5).abs() < 1e-5);
        assert!(hit.normal.x > 0.0);
    }
}
