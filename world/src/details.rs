//! Typed detail registries attached to the cells of placed objects.
//!
//! Every local cell of a [`crate::GridObject`] owns a [`CellDetails`]
//! registry holding at most one detail per concrete type. Details receive
//! lifecycle callbacks as their owner is placed, updated and removed, and are
//! told which grid cell they currently sit on.

use std::{
    any::{self, Any, TypeId},
    fmt,
};

use plinth_core::{CellCoord, GridDimensions, LocalCoord, ObjectId, Orientation};

use crate::DetailError;

/// Describes the placed object that owns a detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerInfo {
    /// Identifier the grid assigned to the owner.
    pub object: ObjectId,
    /// Anchor cell of the owner's footprint.
    pub start: CellCoord,
    /// Orientation of the owner.
    pub orientation: Orientation,
    /// Footprint dimensions of the owner.
    pub dimensions: GridDimensions,
}

/// Type-erasure helper implemented for every `'static` type.
pub trait AsAny: Any {
    /// Borrows the value as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrows the value as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour that can be attached to a single local cell of a grid object.
pub trait CellDetail: AsAny + fmt::Debug {
    /// Called after the owning object has been placed on the grid.
    fn on_owner_placed(&mut self, _owner: &OwnerInfo) {}

    /// Called once per grid update while the owner is placed.
    fn on_owner_update(&mut self) {}

    /// Called before the owning object leaves the grid.
    ///
    /// Returning an error aborts the removal. Details notified earlier are not
    /// rolled back.
    fn on_owner_removed(&mut self, _owner: &OwnerInfo) -> Result<(), DetailError> {
        Ok(())
    }

    /// Called when the detail is attached to, or detached from, a grid cell.
    fn on_cell_assigned(&mut self, _cell: Option<CellCoord>) {}
}

struct DetailEntry {
    type_id: TypeId,
    type_name: &'static str,
    detail: Box<dyn CellDetail>,
}

impl fmt::Debug for DetailEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailEntry")
            .field("type_name", &self.type_name)
            .field("detail", &self.detail)
            .finish()
    }
}

/// Collection of details keyed by their concrete type, kept in insertion order.
#[derive(Debug, Default)]
pub struct CellDetails {
    entries: Vec<DetailEntry>,
}

impl CellDetails {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `detail`, rejecting a second detail of the same type.
    pub fn add_detail<T: CellDetail>(&mut self, detail: T) -> Result<(), DetailError> {
        if self.contains::<T>() {
            let type_name = any::type_name::<T>();
            tracing::error!(type_name, "detail already registered on this cell");
            return Err(DetailError::Duplicate { type_name });
        }
        self.push(detail);
        Ok(())
    }

    /// Registers `detail` unless one of the same type exists, returning
    /// whether it was added.
    pub fn try_add_detail<T: CellDetail>(&mut self, detail: T, suppress_warning: bool) -> bool {
        if self.contains::<T>() {
            if !suppress_warning {
                tracing::warn!(
                    type_name = any::type_name::<T>(),
                    "detail already registered on this cell"
                );
            }
            return false;
        }
        self.push(detail);
        true
    }

    fn push<T: CellDetail>(&mut self, detail: T) {
        self.entries.push(DetailEntry {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            detail: Box::new(detail),
        });
    }

    /// Reports whether a detail of type `T` is registered.
    #[must_use]
    pub fn contains<T: CellDetail>(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.type_id == TypeId::of::<T>())
    }

    /// Retrieves the detail of type `T`.
    #[must_use]
    pub fn try_get_detail<T: CellDetail>(&self) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.type_id == TypeId::of::<T>())
            .and_then(|entry| (*entry.detail).as_any().downcast_ref::<T>())
    }

    /// Mutably retrieves the detail of type `T`.
    #[must_use]
    pub fn try_get_detail_mut<T: CellDetail>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|entry| entry.type_id == TypeId::of::<T>())
            .and_then(|entry| (*entry.detail).as_any_mut().downcast_mut::<T>())
    }

    /// Number of registered details.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no details are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Type names of the registered details in insertion order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.type_name)
    }

    /// Notifies every detail that its owner was placed.
    pub fn trigger_on_place(&mut self, owner: &OwnerInfo) {
        for entry in &mut self.entries {
            entry.detail.on_owner_placed(owner);
        }
    }

    /// Notifies every detail of a grid update.
    pub fn trigger_on_update(&mut self) {
        for entry in &mut self.entries {
            entry.detail.on_owner_update();
        }
    }

    /// Notifies every detail that its owner is leaving, stopping at the first
    /// failure.
    pub fn trigger_on_remove(&mut self, owner: &OwnerInfo) -> Result<(), DetailError> {
        for entry in &mut self.entries {
            entry.detail.on_owner_removed(owner)?;
        }
        Ok(())
    }

    /// Tells every detail which grid cell it is attached to.
    pub fn assign_cell(&mut self, cell: Option<CellCoord>) {
        for entry in &mut self.entries {
            entry.detail.on_cell_assigned(cell);
        }
    }
}

/// One [`CellDetails`] registry per local column and row of an object.
///
/// Registries are addressed by local coordinates, which stay fixed while the
/// object rotates. All layers of a column and row share a registry.
#[derive(Debug)]
pub struct ObjectCellDetails {
    columns: u32,
    rows: u32,
    registries: Vec<CellDetails>,
}

impl ObjectCellDetails {
    /// Creates empty registries covering `dimensions`.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        let count = usize::try_from(dimensions.columns() * dimensions.rows()).unwrap_or(0);
        Self {
            columns: dimensions.columns(),
            rows: dimensions.rows(),
            registries: (0..count).map(|_| CellDetails::new()).collect(),
        }
    }

    fn index(&self, local: LocalCoord) -> Option<usize> {
        if local.column() >= self.columns || local.row() >= self.rows {
            return None;
        }
        usize::try_from(local.column() * self.rows + local.row()).ok()
    }

    /// Registry for the local cell at `local`.
    #[must_use]
    pub fn details_at_local(&self, local: LocalCoord) -> Option<&CellDetails> {
        let index = self.index(local)?;
        self.registries.get(index)
    }

    /// Mutable registry for the local cell at `local`.
    #[must_use]
    pub fn details_at_local_mut(&mut self, local: LocalCoord) -> Option<&mut CellDetails> {
        let index = self.index(local)?;
        self.registries.get_mut(index)
    }

    /// Total number of details across every local cell.
    #[must_use]
    pub fn detail_count(&self) -> usize {
        self.registries.iter().map(CellDetails::len).sum()
    }

    /// Fans the placement hook out to every local registry.
    pub fn trigger_on_place(&mut self, owner: &OwnerInfo) {
        for registry in &mut self.registries {
            registry.trigger_on_place(owner);
        }
    }

    /// Fans the update hook out to every local registry.
    pub fn trigger_on_update(&mut self) {
        for registry in &mut self.registries {
            registry.trigger_on_update();
        }
    }

    /// Fans the removal hook out to every local registry, stopping at the
    /// first failure.
    pub fn trigger_on_remove(&mut self, owner: &OwnerInfo) -> Result<(), DetailError> {
        for registry in &mut self.registries {
            registry.trigger_on_remove(owner)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Turret {
        placed: u32,
        cell: Option<CellCoord>,
    }

    impl CellDetail for Turret {
        fn on_owner_placed(&mut self, _owner: &OwnerInfo) {
            self.placed += 1;
        }

        fn on_cell_assigned(&mut self, cell: Option<CellCoord>) {
            self.cell = cell;
        }
    }

    #[derive(Debug)]
    struct Anchor;

    impl CellDetail for Anchor {
        fn on_owner_removed(&mut self, _owner: &OwnerInfo) -> Result<(), DetailError> {
            Err(DetailError::RemovalRefused {
                type_name: "Anchor",
                reason: "anchored".to_owned(),
            })
        }
    }

    fn owner() -> OwnerInfo {
        OwnerInfo {
            object: ObjectId::new(3),
            start: CellCoord::new(0, 0, 0),
            orientation: Orientation::BottomLeft,
            dimensions: GridDimensions::default(),
        }
    }

    #[test]
    fn duplicate_detail_is_rejected() {
        let mut details = CellDetails::new();
        assert!(details.add_detail(Turret::default()).is_ok());
        let error = details
            .add_detail(Turret::default())
            .expect_err("duplicate must fail");
        assert!(matches!(error, DetailError::Duplicate { .. }));
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn try_add_detail_reports_success() {
        let mut details = CellDetails::new();
        assert!(details.try_add_detail(Turret::default(), false));
        assert!(!details.try_add_detail(Turret::default(), true));
        assert!(details.try_add_detail(Anchor, false));
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn lookup_is_by_concrete_type() {
        let mut details = CellDetails::new();
        details.add_detail(Turret::default()).expect("add turret");
        assert!(details.try_get_detail::<Anchor>().is_none());

        details
            .try_get_detail_mut::<Turret>()
            .expect("turret registered")
            .placed = 7;
        assert_eq!(
            details.try_get_detail::<Turret>().map(|turret| turret.placed),
            Some(7)
        );
    }

    #[test]
    fn lifecycle_hooks_fan_out() {
        let mut details = CellDetails::new();
        details.add_detail(Turret::default()).expect("add turret");
        details.trigger_on_place(&owner());
        details.assign_cell(Some(CellCoord::new(4, 0, 1)));

        let turret = details.try_get_detail::<Turret>().expect("turret");
        assert_eq!(turret.placed, 1);
        assert_eq!(turret.cell, Some(CellCoord::new(4, 0, 1)));
    }

    #[test]
    fn failing_removal_hook_propagates() {
        let mut details = CellDetails::new();
        details.add_detail(Anchor).expect("add anchor");
        assert!(details.trigger_on_remove(&owner()).is_err());
    }

    #[test]
    fn object_details_are_indexed_by_local_cell() {
        let mut details = ObjectCellDetails::new(GridDimensions::flat(2, 3));
        details
            .details_at_local_mut(LocalCoord::new(1, 0, 2))
            .expect("in range")
            .add_detail(Turret::default())
            .expect("add turret");

        assert!(details.details_at_local(LocalCoord::new(2, 0, 0)).is_none());
        assert!(details
            .details_at_local(LocalCoord::new(0, 0, 0))
            .is_some_and(CellDetails::is_empty));
        assert_eq!(details.detail_count(), 1);
    }
}
