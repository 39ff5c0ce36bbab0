#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for the Plinth spatial engine.
//!
//! A [`Grid`] owns every [`Cell`] and every placed [`GridObject`]. Callers hand
//! objects to [`Grid::try_place`] and receive them back from
//! [`Grid::try_remove`]; each outcome is appended to a caller supplied event
//! buffer. Read access for systems and adapters lives in [`query`].

mod cell;
mod config;
mod connectivity;
mod details;
mod error;
mod object;
mod projection;
mod scene;

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use plinth_core::{
    CellCoord, Event, GridDimensions, LocalCoord, ObjectId, Orientation, PlacementError,
    RemovalError,
};

pub use cell::{Cell, DetailSlot, EntryCostRule};
pub use config::{GridSettings, ProjectionSettings};
pub use connectivity::Connectivity;
pub use details::{AsAny, CellDetail, CellDetails, ObjectCellDetails, OwnerInfo};
pub use error::{DetailError, DetailRejection, GridError, PlacementRejection, RampError};
pub use object::{GridObject, ObjectHooks};
pub use projection::{detect_ramp, SurfaceHit, SurfaceId, SurfaceProbe};
pub use scene::{Footprint, SurfaceScene, SurfaceShape};

use projection::ProjectionLattice;

/// Authoritative container of cells and placed objects.
#[derive(Debug)]
pub struct Grid {
    cell_size: f32,
    origin: Vec3,
    columns: i32,
    layers: i32,
    rows: i32,
    cells: HashMap<CellCoord, Cell>,
    connectivity: Connectivity,
    objects: BTreeMap<ObjectId, GridObject>,
    next_object_id: ObjectId,
}

impl Grid {
    /// Builds a dense grid filling the bounding volume described by `settings`.
    pub fn new(settings: &GridSettings) -> Result<Self, GridError> {
        let navigable = settings.navigable;
        Self::with_factory(settings, |coord, origin, size| {
            Cell::new(coord, origin, size).with_navigable(navigable)
        })
    }

    /// Builds a dense grid whose cells are produced by `factory`.
    ///
    /// The factory receives each coordinate with its world origin and cell
    /// size. Cells returned with a different coordinate are discarded.
    pub fn with_factory<F>(settings: &GridSettings, mut factory: F) -> Result<Self, GridError>
    where
        F: FnMut(CellCoord, Vec3, f32) -> Cell,
    {
        let mut grid = Self::empty(settings, Connectivity::Uniform)?;
        for column in 0..grid.columns {
            for layer in 0..grid.layers {
                for row in 0..grid.rows {
                    let coord = CellCoord::new(column, layer, row);
                    let cell = factory(coord, grid.lattice_origin(coord), grid.cell_size);
                    if cell.coord() != coord {
                        tracing::warn!(?coord, produced = ?cell.coord(), "cell factory changed the coordinate, skipping");
                        continue;
                    }
                    let _previous = grid.cells.insert(coord, cell);
                }
            }
        }
        grid.rebuild_connectivity();
        tracing::debug!(
            columns = grid.columns,
            layers = grid.layers,
            rows = grid.rows,
            cells = grid.cells.len(),
            "constructed dense grid"
        );
        Ok(grid)
    }

    /// Builds a grid by projecting rays down onto the surfaces `probe` reports.
    pub fn projected(
        settings: &GridSettings,
        projection: &ProjectionSettings,
        probe: &dyn SurfaceProbe,
    ) -> Result<Self, GridError> {
        let navigable = settings.navigable;
        Self::projected_with_factory(settings, projection, probe, |coord, origin, size| {
            Cell::new(coord, origin, size).with_navigable(navigable)
        })
    }

    /// Builds a projected grid whose cells are produced by `factory`.
    pub fn projected_with_factory<F>(
        settings: &GridSettings,
        projection: &ProjectionSettings,
        probe: &dyn SurfaceProbe,
        mut factory: F,
    ) -> Result<Self, GridError>
    where
        F: FnMut(CellCoord, Vec3, f32) -> Cell,
    {
        let mut grid = Self::empty(settings, Connectivity::ProjectedSurface)?;
        let lattice = ProjectionLattice {
            origin: grid.origin,
            cell_size: grid.cell_size,
            columns: grid.columns,
            rows: grid.rows,
        };
        grid.cells = projection::project_cells(lattice, projection, probe, &mut factory)?;
        grid.rebuild_connectivity();
        tracing::debug!(
            columns = grid.columns,
            rows = grid.rows,
            cells = grid.cells.len(),
            ramps = grid.cells.values().filter(|cell| cell.ramp().is_some()).count(),
            "constructed projected grid"
        );
        Ok(grid)
    }

    fn empty(settings: &GridSettings, connectivity: Connectivity) -> Result<Self, GridError> {
        settings.validate()?;
        let cell_size = settings.cell_size;
        let origin = Vec3::new(
            settings.center.x - settings.size.x / 2.0,
            settings.center.y,
            settings.center.z - settings.size.z / 2.0,
        );
        let count = |extent: f32| ((extent / cell_size).floor() as i32).max(0);
        Ok(Self {
            cell_size,
            origin,
            columns: count(settings.size.x),
            layers: settings.y_axis_max.saturating_add(1),
            rows: count(settings.size.z),
            cells: HashMap::new(),
            connectivity,
            objects: BTreeMap::new(),
            next_object_id: ObjectId::new(0),
        })
    }

    /// Side length of every cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the grid's bottom-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Number of columns inside the dense bounds.
    #[must_use]
    pub const fn columns(&self) -> i32 {
        self.columns
    }

    /// Number of layers inside the dense bounds.
    #[must_use]
    pub const fn layers(&self) -> i32 {
        self.layers
    }

    /// Number of rows inside the dense bounds.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Strategy used to derive neighbour edges.
    #[must_use]
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Number of cells stored by the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Converts a world point into the coordinate of the cell containing it.
    ///
    /// Heights are rounded to one decimal first so points resting on a cell's
    /// floor are not pushed into the layer below by float noise.
    #[must_use]
    pub fn world_to_coordinate(&self, point: Vec3) -> Option<CellCoord> {
        let column = self.axis_index(point.x - self.origin.x, self.columns)?;
        let layer = self.axis_index(
            projection::round_tenths(point.y) - self.origin.y,
            self.layers,
        )?;
        let row = self.axis_index(point.z - self.origin.z, self.rows)?;
        Some(CellCoord::new(column, layer, row))
    }

    fn axis_index(&self, offset: f32, count: i32) -> Option<i32> {
        let index = (offset / self.cell_size).floor();
        if !index.is_finite() || index < 0.0 || index >= count as f32 {
            return None;
        }
        Some(index as i32)
    }

    /// Reports whether `coord` lies inside the dense column, layer and row bounds.
    #[must_use]
    pub fn is_within_dense_bounds(&self, coord: CellCoord) -> bool {
        (0..self.columns).contains(&coord.column())
            && (0..self.layers).contains(&coord.layer())
            && (0..self.rows).contains(&coord.row())
    }

    /// Reports whether `coord` is inside the dense bounds or names a stored cell.
    #[must_use]
    pub fn is_valid_coordinate(&self, coord: CellCoord) -> bool {
        self.is_within_dense_bounds(coord) || self.cells.contains_key(&coord)
    }

    fn lattice_origin(&self, coord: CellCoord) -> Vec3 {
        self.origin
            + Vec3::new(
                coord.column() as f32,
                coord.layer() as f32,
                coord.row() as f32,
            ) * self.cell_size
    }

    /// World position an object anchored at `coord` with `orientation` is
    /// translated to.
    #[must_use]
    pub fn coordinate_to_world(&self, coord: CellCoord, orientation: Orientation) -> Option<Vec3> {
        let base = match self.cells.get(&coord) {
            Some(cell) => cell.origin(),
            None if self.is_within_dense_bounds(coord) => self.lattice_origin(coord),
            None => return None,
        };
        Some(base + orientation.anchor_offset(self.cell_size))
    }

    /// Cell stored at `coord`.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// Mutable cell stored at `coord`.
    #[must_use]
    pub fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        self.cells.get_mut(&coord)
    }

    /// Cell containing the world point.
    #[must_use]
    pub fn cell_at_world(&self, point: Vec3) -> Option<&Cell> {
        self.world_to_coordinate(point)
            .and_then(|coord| self.cells.get(&coord))
    }

    /// Every stored cell, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Coordinates of every stored cell in ascending order.
    #[must_use]
    pub fn coords(&self) -> Vec<CellCoord> {
        let mut coords: Vec<CellCoord> = self.cells.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Updates whether pathfinding may traverse the cell at `coord`.
    ///
    /// Returns `false` when no cell exists there.
    pub fn set_navigable(&mut self, coord: CellCoord, navigable: bool) -> bool {
        match self.cells.get_mut(&coord) {
            Some(cell) => {
                cell.set_navigable(navigable);
                true
            }
            None => false,
        }
    }

    /// Adds directed edges in both directions between two stored cells.
    ///
    /// Returns `false` without changes when either cell is missing.
    pub fn connect_both_ways(&mut self, a: CellCoord, b: CellCoord) -> bool {
        if !self.cells.contains_key(&a) || !self.cells.contains_key(&b) {
            return false;
        }
        if let Some(cell) = self.cells.get_mut(&a) {
            let _added = cell.add_neighbor(b);
        }
        if let Some(cell) = self.cells.get_mut(&b) {
            let _added = cell.add_neighbor(a);
        }
        true
    }

    /// Removes the directed edges between two cells in both directions.
    pub fn disconnect_both_ways(&mut self, a: CellCoord, b: CellCoord) {
        if let Some(cell) = self.cells.get_mut(&a) {
            let _removed = cell.remove_neighbor(b);
        }
        if let Some(cell) = self.cells.get_mut(&b) {
            let _removed = cell.remove_neighbor(a);
        }
    }

    /// Reports whether `a` and `b` link to each other.
    #[must_use]
    pub fn is_reciprocal(&self, a: CellCoord, b: CellCoord) -> bool {
        let links = |from: CellCoord, to: CellCoord| {
            self.cells
                .get(&from)
                .is_some_and(|cell| cell.has_neighbor(to))
        };
        links(a, b) && links(b, a)
    }

    /// Discards every neighbour edge and derives them again from the grid's
    /// connectivity strategy.
    pub fn rebuild_connectivity(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear_neighbors();
        }
        for (from, to) in connectivity::edges(self.connectivity, &self.cells) {
            if let Some(cell) = self.cells.get_mut(&from) {
                let _added = cell.add_neighbor(to);
            }
        }
    }

    /// Visits every stored cell covered by a footprint together with the
    /// local coordinate that maps onto it. Missing cells are skipped.
    pub fn for_each_footprint_cell<F>(
        &self,
        dimensions: GridDimensions,
        orientation: Orientation,
        start: CellCoord,
        mut visit: F,
    ) where
        F: FnMut(&Cell, LocalCoord),
    {
        for local in dimensions.local_coords() {
            let (columns, layers, rows) = orientation.footprint_offset(local);
            if let Some(cell) = self.cells.get(&start.offset(columns, layers, rows)) {
                visit(cell, local);
            }
        }
    }

    /// Stored cells covered by a footprint paired with their local coordinates.
    #[must_use]
    pub fn footprint(
        &self,
        dimensions: GridDimensions,
        orientation: Orientation,
        start: CellCoord,
    ) -> Vec<(CellCoord, LocalCoord)> {
        let mut cells = Vec::new();
        self.for_each_footprint_cell(dimensions, orientation, start, |cell, local| {
            cells.push((cell.coord(), local));
        });
        cells
    }

    /// Reports whether a footprint with the signed extents fits the dense
    /// bounds when anchored at `start`.
    ///
    /// Each extent counts the anchor cell, so it is moved one step toward zero
    /// before locating the far corner.
    #[must_use]
    pub fn within_bounds(
        &self,
        start: CellCoord,
        column_length: i32,
        layer_length: i32,
        row_length: i32,
    ) -> bool {
        let corner = start.offset(
            mean_reversion(column_length),
            mean_reversion(layer_length),
            mean_reversion(row_length),
        );
        (0..self.columns).contains(&corner.column())
            && (0..self.layers).contains(&corner.layer())
            && (0..self.rows).contains(&corner.row())
    }

    /// Reports whether an object with `dimensions` and `orientation` fits the
    /// grid when anchored at `start`, ignoring occupancy.
    #[must_use]
    pub fn are_all_cells_placeable(
        &self,
        start: CellCoord,
        dimensions: GridDimensions,
        orientation: Orientation,
    ) -> bool {
        if !self.is_valid_coordinate(start) {
            tracing::warn!(?start, "placement start is not a valid coordinate");
            return false;
        }
        let (columns, layers, rows) = orientation.extents(dimensions);
        self.within_bounds(start, columns, layers, rows)
    }

    /// Reports whether `object` fits at `start` and every stored cell it
    /// would cover is available.
    #[must_use]
    pub fn are_all_cells_available(&self, start: CellCoord, object: &GridObject) -> bool {
        if !self.are_all_cells_placeable(start, object.dimensions(), object.orientation()) {
            return false;
        }
        let mut available = true;
        self.for_each_footprint_cell(
            object.dimensions(),
            object.orientation(),
            start,
            |cell, _| available &= cell.is_available(),
        );
        available
    }

    /// Places `object` with its anchor at `start`.
    ///
    /// With `force` set only the bounds are checked and occupied cells are
    /// claimed anyway. A rejected object is handed back unchanged inside the
    /// error.
    pub fn try_place(
        &mut self,
        mut object: GridObject,
        start: CellCoord,
        force: bool,
        out_events: &mut Vec<Event>,
    ) -> Result<ObjectId, PlacementRejection> {
        if let Err(reason) = self.check_placement(&object, start, force) {
            tracing::warn!(?start, ?reason, "placement rejected");
            out_events.push(Event::PlacementRejected { start, reason });
            return Err(PlacementRejection { object, reason });
        }

        let id = self.next_object_id;
        self.next_object_id = ObjectId::new(id.get().wrapping_add(1));

        let orientation = object.orientation();
        let translation = self
            .coordinate_to_world(start, orientation)
            .unwrap_or_else(|| self.lattice_origin(start) + orientation.anchor_offset(self.cell_size));
        object.mark_placed(start, translation);

        for (coord, local) in self.footprint(object.dimensions(), orientation, start) {
            if let Some(cell) = self.cells.get_mut(&coord) {
                cell.add_object(id);
                cell.attach_detail_slot(DetailSlot::new(id, local));
            }
            if let Some(details) = object.details_mut().details_at_local_mut(local) {
                details.assign_cell(Some(coord));
            }
        }

        let owner = OwnerInfo {
            object: id,
            start,
            orientation,
            dimensions: object.dimensions(),
        };
        object.notify_placed(&owner);

        let replaced = self.objects.insert(id, object);
        debug_assert!(replaced.is_none(), "object identifiers are never reused");
        out_events.push(Event::ObjectPlaced {
            object: id,
            start,
            orientation,
        });
        Ok(id)
    }

    fn check_placement(
        &self,
        object: &GridObject,
        start: CellCoord,
        force: bool,
    ) -> Result<(), PlacementError> {
        if !self.is_valid_coordinate(start) {
            return Err(PlacementError::InvalidCoordinate);
        }
        if !self.are_all_cells_placeable(start, object.dimensions(), object.orientation()) {
            return Err(PlacementError::OutOfBounds);
        }
        if !force && !self.are_all_cells_available(start, object) {
            return Err(PlacementError::Occupied);
        }
        Ok(())
    }

    /// Removes the placed object identified by `id` and returns it.
    ///
    /// The footprint is verified before anything changes. A detail failing its
    /// removal hook aborts the removal with the object still placed.
    pub fn try_remove(
        &mut self,
        id: ObjectId,
        out_events: &mut Vec<Event>,
    ) -> Result<GridObject, RemovalError> {
        match self.remove_object(id) {
            Ok((mut object, start)) => {
                object.mark_removed();
                out_events.push(Event::ObjectRemoved { object: id, start });
                Ok(object)
            }
            Err(reason) => {
                out_events.push(Event::RemovalRejected { object: id, reason });
                Err(reason)
            }
        }
    }

    fn remove_object(&mut self, id: ObjectId) -> Result<(GridObject, CellCoord), RemovalError> {
        let Some(object) = self.objects.get(&id) else {
            tracing::error!(?id, "removal requested for an object that is not placed");
            return Err(RemovalError::NotPlaced);
        };
        let Some(start) = object.starting_cell() else {
            tracing::error!(?id, "placed object has no starting cell");
            return Err(RemovalError::NotPlaced);
        };

        let owner = OwnerInfo {
            object: id,
            start,
            orientation: object.orientation(),
            dimensions: object.dimensions(),
        };
        let footprint = self.footprint(owner.dimensions, owner.orientation, start);
        for (coord, _) in &footprint {
            let occupant = self.cells.get(coord).and_then(Cell::occupant);
            if occupant != Some(id) {
                tracing::error!(?id, ?coord, ?occupant, "footprint cell held by another occupant");
                return Err(RemovalError::Ambiguous);
            }
        }

        let Some(object) = self.objects.get_mut(&id) else {
            return Err(RemovalError::NotPlaced);
        };
        if let Err(error) = object.notify_removed(&owner) {
            tracing::error!(?id, %error, "cell detail failed during removal");
            return Err(RemovalError::DetailHookFailed);
        }

        let Some(mut object) = self.objects.remove(&id) else {
            return Err(RemovalError::NotPlaced);
        };
        for (coord, local) in footprint {
            if let Some(details) = object.details_mut().details_at_local_mut(local) {
                details.assign_cell(None);
            }
            if let Some(cell) = self.cells.get_mut(&coord) {
                cell.detach_detail_slot();
                let _released = cell.remove_current_object();
            }
        }
        Ok((object, start))
    }

    /// Runs the update hooks of every placed object and its details.
    pub fn update_details(&mut self) {
        for object in self.objects.values_mut() {
            object.notify_update();
        }
    }
}

/// Moves `value` one step toward zero.
fn mean_reversion(value: i32) -> i32 {
    value - value.signum()
}

/// Read-only views over a [`Grid`] for systems and adapters.
pub mod query {
    use plinth_core::{CellCoord, Direction, ObjectId};

    use super::{Cell, CellDetail, CellDetails, Grid, GridObject};

    /// Placed object identified by `id`.
    #[must_use]
    pub fn placed_object(grid: &Grid, id: ObjectId) -> Option<&GridObject> {
        grid.objects.get(&id)
    }

    /// Every placed object in identifier order.
    pub fn placed_objects(grid: &Grid) -> impl Iterator<Item = (ObjectId, &GridObject)> {
        grid.objects.iter().map(|(id, object)| (*id, object))
    }

    /// Object occupying the cell at `coord`.
    #[must_use]
    pub fn object_at(grid: &Grid, coord: CellCoord) -> Option<&GridObject> {
        grid.cell(coord)
            .and_then(Cell::occupant)
            .and_then(|id| grid.objects.get(&id))
    }

    /// Detail registry attached to the cell at `coord`.
    #[must_use]
    pub fn details_at(grid: &Grid, coord: CellCoord) -> Option<&CellDetails> {
        let slot = grid.cell(coord)?.detail_slot()?;
        grid.objects
            .get(&slot.object())?
            .details()
            .details_at_local(slot.local())
    }

    /// Occupants of the cells north, east, south and west of `coord`.
    #[must_use]
    pub fn objects_around(grid: &Grid, coord: CellCoord) -> [Option<ObjectId>; 4] {
        Direction::ALL.map(|direction| grid.cell(coord.step(direction)).and_then(Cell::occupant))
    }

    /// Details of type `T` on the cells north, east, south and west of `coord`.
    #[must_use]
    pub fn details_around<T: CellDetail>(grid: &Grid, coord: CellCoord) -> [Option<&T>; 4] {
        Direction::ALL.map(|direction| {
            details_at(grid, coord.step(direction)).and_then(CellDetails::try_get_detail::<T>)
        })
    }

    /// Cell one step from `coord` toward `direction`.
    ///
    /// With `require_edge` set the cell must be a neighbour of `coord`, which
    /// may place it on another layer when a ramp joins them.
    #[must_use]
    pub fn cell_neighbor(
        grid: &Grid,
        coord: CellCoord,
        direction: Direction,
        require_edge: bool,
    ) -> Option<&Cell> {
        if !require_edge {
            return grid.cell(coord.step(direction));
        }
        let (columns, rows) = direction.offset();
        grid.cell(coord)?
            .neighbors()
            .find(|neighbor| {
                neighbor.column() - coord.column() == columns && neighbor.row() - coord.row() == rows
            })
            .and_then(|neighbor| grid.cell(neighbor))
    }
}
