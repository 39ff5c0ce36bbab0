//! Individual grid cells and their directed neighbour edges.

use std::{collections::BTreeSet, fmt, sync::Arc};

use glam::Vec3;
use plinth_core::{CellCoord, LocalCoord, ObjectId, RampDescriptor};

/// Computes the cost of stepping into a cell, replacing its static cost.
pub trait EntryCostRule {
    /// Cost charged for moving from `from` into `destination`.
    fn cost_to_enter(&self, destination: &Cell, from: CellCoord) -> u32;
}

impl<F> EntryCostRule for F
where
    F: Fn(&Cell, CellCoord) -> u32,
{
    fn cost_to_enter(&self, destination: &Cell, from: CellCoord) -> u32 {
        self(destination, from)
    }
}

/// Links a cell to the local detail registry of the object covering it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DetailSlot {
    object: ObjectId,
    local: LocalCoord,
}

impl DetailSlot {
    /// Creates a slot pointing at `local` within `object`'s footprint.
    #[must_use]
    pub const fn new(object: ObjectId, local: LocalCoord) -> Self {
        Self { object, local }
    }

    /// Object owning the referenced registry.
    #[must_use]
    pub const fn object(&self) -> ObjectId {
        self.object
    }

    /// Local footprint coordinate of the referenced registry.
    #[must_use]
    pub const fn local(&self) -> LocalCoord {
        self.local
    }
}

/// Discrete cubic cell stored by a [`crate::Grid`].
#[derive(Clone)]
pub struct Cell {
    coord: CellCoord,
    origin: Vec3,
    size: f32,
    available: bool,
    navigable: bool,
    cost: u32,
    cost_rule: Option<Arc<dyn EntryCostRule>>,
    ramp: Option<RampDescriptor>,
    detail_slot: Option<DetailSlot>,
    occupant: Option<ObjectId>,
    neighbors: BTreeSet<CellCoord>,
}

impl Cell {
    /// Creates an available, navigable cell with an entry cost of one.
    #[must_use]
    pub fn new(coord: CellCoord, origin: Vec3, size: f32) -> Self {
        Self {
            coord,
            origin,
            size,
            available: true,
            navigable: true,
            cost: 1,
            cost_rule: None,
            ramp: None,
            detail_slot: None,
            occupant: None,
            neighbors: BTreeSet::new(),
        }
    }

    /// Sets the cell's initial navigability.
    #[must_use]
    pub fn with_navigable(mut self, navigable: bool) -> Self {
        self.navigable = navigable;
        self
    }

    /// Sets the cell's static entry cost.
    #[must_use]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Installs a rule that computes entry costs dynamically.
    #[must_use]
    pub fn with_cost_rule(mut self, rule: impl EntryCostRule + 'static) -> Self {
        self.cost_rule = Some(Arc::new(rule));
        self
    }

    /// Marks the cell as a ramp.
    #[must_use]
    pub fn with_ramp(mut self, ramp: RampDescriptor) -> Self {
        self.ramp = Some(ramp);
        self
    }

    /// Grid coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// World-space position of the cell's bottom-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Side length of the cell in world units.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Horizontal center of the cell at the height of its origin.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let half = self.size / 2.0;
        self.origin + Vec3::new(half, 0.0, half)
    }

    /// Reports whether an object may claim the cell.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Reports whether pathfinding may traverse the cell.
    #[must_use]
    pub const fn is_navigable(&self) -> bool {
        self.navigable
    }

    /// Updates whether pathfinding may traverse the cell.
    pub fn set_navigable(&mut self, navigable: bool) {
        self.navigable = navigable;
    }

    /// Static entry cost of the cell.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Replaces the static entry cost of the cell.
    pub fn set_cost(&mut self, cost: u32) {
        self.cost = cost;
    }

    /// Cost of stepping into this cell from `from`.
    #[must_use]
    pub fn cost_to_enter(&self, from: CellCoord) -> u32 {
        match &self.cost_rule {
            Some(rule) => rule.cost_to_enter(self, from),
            None => self.cost,
        }
    }

    /// Ramp descriptor when the cell lies on a slope.
    #[must_use]
    pub const fn ramp(&self) -> Option<&RampDescriptor> {
        self.ramp.as_ref()
    }

    /// Object currently occupying the cell.
    #[must_use]
    pub const fn occupant(&self) -> Option<ObjectId> {
        self.occupant
    }

    /// Detail registry attached to the cell by its occupant.
    #[must_use]
    pub const fn detail_slot(&self) -> Option<DetailSlot> {
        self.detail_slot
    }

    pub(crate) fn attach_detail_slot(&mut self, slot: DetailSlot) {
        self.detail_slot = Some(slot);
    }

    pub(crate) fn detach_detail_slot(&mut self) {
        self.detail_slot = None;
    }

    /// Coordinates this cell has a directed edge toward, in ascending order.
    pub fn neighbors(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.neighbors.iter().copied()
    }

    /// Reports whether the cell has a directed edge toward `coord`.
    #[must_use]
    pub fn has_neighbor(&self, coord: CellCoord) -> bool {
        self.neighbors.contains(&coord)
    }

    /// Adds a directed edge toward `coord`, returning `true` when it is new.
    pub fn add_neighbor(&mut self, coord: CellCoord) -> bool {
        self.neighbors.insert(coord)
    }

    /// Removes the directed edge toward `coord`, returning `true` when it existed.
    pub fn remove_neighbor(&mut self, coord: CellCoord) -> bool {
        self.neighbors.remove(&coord)
    }

    pub(crate) fn clear_neighbors(&mut self) {
        self.neighbors.clear();
    }

    /// Claims the cell for `object` when it is available.
    pub fn try_add_object(&mut self, object: ObjectId) -> bool {
        if !self.available {
            return false;
        }
        self.add_object(object);
        true
    }

    /// Claims the cell for `object` regardless of availability.
    pub fn add_object(&mut self, object: ObjectId) {
        self.occupant = Some(object);
        self.available = false;
    }

    /// Releases the current occupant, making the cell available again.
    pub fn remove_current_object(&mut self) -> Option<ObjectId> {
        self.available = true;
        self.occupant.take()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("coord", &self.coord)
            .field("origin", &self.origin)
            .field("size", &self.size)
            .field("available", &self.available)
            .field("navigable", &self.navigable)
            .field("cost", &self.cost)
            .field("dynamic_cost", &self.cost_rule.is_some())
            .field("ramp", &self.ramp)
            .field("detail_slot", &self.detail_slot)
            .field("occupant", &self.occupant)
            .field("neighbors", &self.neighbors)
            .finish()
    }
}
