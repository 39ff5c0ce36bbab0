//! Multi-cell objects that can be placed on a grid.

use std::fmt;

use glam::{Quat, Vec3};
use plinth_core::{quarter_turn, CellCoord, GridDimensions, LocalCoord, Orientation};

use crate::{
    details::{CellDetail, ObjectCellDetails, OwnerInfo},
    DetailError, DetailRejection,
};

/// Object-level lifecycle callbacks, invoked before the object's cell details.
pub trait ObjectHooks: fmt::Debug {
    /// Called after the object has been placed on the grid.
    fn on_placed(&mut self, _owner: &OwnerInfo) {}

    /// Called once per grid update while the object is placed.
    fn on_update(&mut self) {}

    /// Called before the object's details are told about its removal.
    fn on_removed(&mut self, _owner: &OwnerInfo) {}
}

/// Object spanning one or more cells, carrying per-cell details.
///
/// The world transform rotates in lockstep with the orientation. An object
/// owned by the caller is unplaced; once handed to a grid it can only be read
/// until removal returns it.
#[derive(Debug)]
pub struct GridObject {
    dimensions: GridDimensions,
    orientation: Orientation,
    translation: Vec3,
    rotation: Quat,
    details: ObjectCellDetails,
    hooks: Option<Box<dyn ObjectHooks>>,
    starting_cell: Option<CellCoord>,
}

impl GridObject {
    /// Creates an unplaced, unrotated object with empty detail registries.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            orientation: Orientation::BottomLeft,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            details: ObjectCellDetails::new(dimensions),
            hooks: None,
            starting_cell: None,
        }
    }

    /// Sets the orientation and matching rotation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self.rotation = orientation.rotation();
        self
    }

    /// Installs object-level lifecycle callbacks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl ObjectHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Registers `detail` on the local cell at `local`.
    ///
    /// A local coordinate outside the footprint is skipped with a warning. A
    /// detail of a type already registered there is rejected and the object
    /// comes back inside the error.
    pub fn with_detail<T: CellDetail>(
        mut self,
        local: LocalCoord,
        detail: T,
    ) -> Result<Self, DetailRejection> {
        match self.details.details_at_local_mut(local) {
            Some(registry) => {
                if let Err(error) = registry.add_detail(detail) {
                    return Err(DetailRejection {
                        object: self,
                        error,
                    });
                }
            }
            None => {
                tracing::warn!(?local, "detail target lies outside the object footprint");
            }
        }
        Ok(self)
    }

    /// Footprint dimensions of the object.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Current orientation of the object.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// World translation of the object's anchor corner.
    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        self.translation
    }

    /// World rotation of the object about the vertical axis.
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Anchor cell while the object is placed.
    #[must_use]
    pub const fn starting_cell(&self) -> Option<CellCoord> {
        self.starting_cell
    }

    /// Reports whether the object currently sits on a grid.
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        self.starting_cell.is_some()
    }

    /// Per-cell detail registries of the object.
    #[must_use]
    pub const fn details(&self) -> &ObjectCellDetails {
        &self.details
    }

    /// Mutable per-cell detail registries of the object.
    pub fn details_mut(&mut self) -> &mut ObjectCellDetails {
        &mut self.details
    }

    /// Turns the object 90 degrees clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.orientation = self.orientation.rotate_clockwise();
        self.rotation = (quarter_turn() * self.rotation).normalize();
    }

    /// Turns the object 90 degrees counter-clockwise.
    pub fn rotate_counter_clockwise(&mut self) {
        self.orientation = self.orientation.rotate_counter_clockwise();
        self.rotation = (quarter_turn().inverse() * self.rotation).normalize();
    }

    pub(crate) fn mark_placed(&mut self, start: CellCoord, translation: Vec3) {
        self.starting_cell = Some(start);
        self.translation = translation;
        self.rotation = self.orientation.rotation();
    }

    pub(crate) fn mark_removed(&mut self) {
        self.starting_cell = None;
    }

    pub(crate) fn notify_placed(&mut self, owner: &OwnerInfo) {
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_placed(owner);
        }
        self.details.trigger_on_place(owner);
    }

    pub(crate) fn notify_update(&mut self) {
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_update();
        }
        self.details.trigger_on_update();
    }

    pub(crate) fn notify_removed(&mut self, owner: &OwnerInfo) -> Result<(), DetailError> {
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_removed(owner);
        }
        self.details.trigger_on_remove(owner)
    }
}
