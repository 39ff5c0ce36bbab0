#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Plinth grid engine.
//!
//! This crate defines the value types that connect the authoritative grid,
//! the pathfinding system, and adapters. Cells are addressed by [`CellCoord`],
//! multi-cell objects describe their footprint with [`GridDimensions`] and an
//! [`Orientation`], and every placement or removal performed by the grid is
//! broadcast as an [`Event`] so callers can react deterministically.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as column, layer and row indices.
///
/// Columns run along the world X axis, layers along Y and rows along Z.
/// Coordinates order by column, then layer, then row so cell maps iterate
/// deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    layer: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, layer: i32, row: i32) -> Self {
        Self { column, layer, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based vertical layer index of the cell.
    #[must_use]
    pub const fn layer(&self) -> i32 {
        self.layer
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided per-axis deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, layers: i32, rows: i32) -> Self {
        Self {
            column: self.column.saturating_add(columns),
            layer: self.layer.saturating_add(layers),
            row: self.row.saturating_add(rows),
        }
    }

    /// Neighbouring coordinate one step toward `direction` on the same layer.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (columns, rows) = direction.offset();
        self.offset(columns, 0, rows)
    }

    /// Coordinate directly above this one.
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Coordinate directly below this one.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Manhattan distance across columns and rows, ignoring layers.
    #[must_use]
    pub fn planar_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Manhattan distance across all three axes.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.planar_distance(other) + self.layer.abs_diff(other.layer)
    }
}

/// Cell coordinate relative to a multi-cell object's own footprint.
///
/// Local coordinates never change when the object rotates; the grid maps them
/// onto absolute cells through the object's [`Orientation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalCoord {
    column: u32,
    layer: u32,
    row: u32,
}

impl LocalCoord {
    /// Creates a new local coordinate.
    #[must_use]
    pub const fn new(column: u32, layer: u32, row: u32) -> Self {
        Self { column, layer, row }
    }

    /// Column within the object's footprint.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Layer within the object's footprint.
    #[must_use]
    pub const fn layer(&self) -> u32 {
        self.layer
    }

    /// Row within the object's footprint.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Footprint size of a multi-cell object measured in whole cells.
///
/// Every axis spans at least one cell. Non-positive inputs are clamped to one
/// and reported through a warning, including values restored by serde.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "DimensionsRecord", into = "DimensionsRecord")]
pub struct GridDimensions {
    columns: u32,
    layers: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates dimensions from raw extents, clamping invalid values to one.
    #[must_use]
    pub fn new(columns: i32, layers: i32, rows: i32) -> Self {
        Self {
            columns: clamp_extent("columns", columns),
            layers: clamp_extent("layers", layers),
            rows: clamp_extent("rows", rows),
        }
    }

    /// Creates single-layer dimensions spanning `columns` by `rows`.
    #[must_use]
    pub fn flat(columns: i32, rows: i32) -> Self {
        Self::new(columns, 1, rows)
    }

    /// Number of columns spanned by the footprint.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of vertical layers spanned by the footprint.
    #[must_use]
    pub const fn layers(&self) -> u32 {
        self.layers
    }

    /// Number of rows spanned by the footprint.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells in the footprint.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.columns * self.layers * self.rows
    }

    /// Iterates every local coordinate in column, layer, row order.
    pub fn local_coords(self) -> impl Iterator<Item = LocalCoord> {
        (0..self.columns).flat_map(move |column| {
            (0..self.layers).flat_map(move |layer| {
                (0..self.rows).map(move |row| LocalCoord::new(column, layer, row))
            })
        })
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self {
            columns: 1,
            layers: 1,
            rows: 1,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct DimensionsRecord {
    columns: i64,
    #[serde(default = "default_layers")]
    layers: i64,
    rows: i64,
}

fn default_layers() -> i64 {
    1
}

impl From<GridDimensions> for DimensionsRecord {
    fn from(dimensions: GridDimensions) -> Self {
        Self {
            columns: i64::from(dimensions.columns),
            layers: i64::from(dimensions.layers),
            rows: i64::from(dimensions.rows),
        }
    }
}

impl From<DimensionsRecord> for GridDimensions {
    fn from(record: DimensionsRecord) -> Self {
        let narrow = |value: i64| i32::try_from(value).unwrap_or(if value < 0 { 0 } else { i32::MAX });
        Self::new(
            narrow(record.columns),
            narrow(record.layers),
            narrow(record.rows),
        )
    }
}

fn clamp_extent(axis: &'static str, value: i32) -> u32 {
    match u32::try_from(value) {
        Ok(extent) if extent > 0 => extent,
        _ => {
            tracing::warn!(axis, value, "grid dimension must be at least 1, defaulting to 1");
            1
        }
    }
}

/// Cardinal directions across the grid's horizontal plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward increasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward decreasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row deltas of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Rotates the direction clockwise by the orientation's quarter turns.
    #[must_use]
    pub fn rotated_by(self, orientation: Orientation) -> Self {
        let index = Self::ALL
            .iter()
            .position(|direction| *direction == self)
            .unwrap_or(0);
        Self::ALL[(index + usize::from(orientation.quarter_turns())) % Self::ALL.len()]
    }

    /// Resolves a unit column/row step back into a direction.
    #[must_use]
    pub fn from_offset(columns: i32, rows: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.offset() == (columns, rows))
    }
}

/// Rotation state of a multi-cell object.
///
/// Each variant names the footprint corner the object's anchor cell occupies.
/// Rotating clockwise cycles BottomLeft → TopLeft → TopRight → BottomRight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// No rotation. The footprint grows toward +column and +row.
    #[default]
    BottomLeft,
    /// Rotated 90 degrees clockwise.
    TopLeft,
    /// Rotated 180 degrees.
    TopRight,
    /// Rotated 270 degrees clockwise.
    BottomRight,
}

impl Orientation {
    /// Next orientation after a 90 degree clockwise turn.
    #[must_use]
    pub const fn rotate_clockwise(self) -> Self {
        match self {
            Self::BottomLeft => Self::TopLeft,
            Self::TopLeft => Self::TopRight,
            Self::TopRight => Self::BottomRight,
            Self::BottomRight => Self::BottomLeft,
        }
    }

    /// Next orientation after a 90 degree counter-clockwise turn.
    #[must_use]
    pub const fn rotate_counter_clockwise(self) -> Self {
        match self {
            Self::BottomLeft => Self::BottomRight,
            Self::TopLeft => Self::BottomLeft,
            Self::TopRight => Self::TopLeft,
            Self::BottomRight => Self::TopRight,
        }
    }

    /// Number of clockwise quarter turns away from [`Orientation::BottomLeft`].
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::BottomLeft => 0,
            Self::TopLeft => 1,
            Self::TopRight => 2,
            Self::BottomRight => 3,
        }
    }

    /// Clockwise yaw in degrees when viewed from above.
    #[must_use]
    pub fn yaw_degrees(self) -> f32 {
        f32::from(self.quarter_turns()) * 90.0
    }

    /// World rotation about the vertical axis matching [`Self::yaw_degrees`].
    #[must_use]
    pub fn rotation(self) -> Quat {
        Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2 * f32::from(self.quarter_turns()))
    }

    /// World offset from a cell's origin to the anchor corner for this orientation.
    #[must_use]
    pub fn anchor_offset(self, cell_size: f32) -> Vec3 {
        match self {
            Self::BottomLeft => Vec3::ZERO,
            Self::TopLeft => Vec3::new(0.0, 0.0, cell_size),
            Self::TopRight => Vec3::new(cell_size, 0.0, cell_size),
            Self::BottomRight => Vec3::new(cell_size, 0.0, 0.0),
        }
    }

    /// Maps a local footprint coordinate onto column, layer and row deltas
    /// from the anchor cell.
    #[must_use]
    pub fn footprint_offset(self, local: LocalCoord) -> (i32, i32, i32) {
        let column = to_delta(local.column());
        let layer = to_delta(local.layer());
        let row = to_delta(local.row());
        match self {
            Self::BottomLeft => (column, layer, row),
            Self::TopLeft => (row, layer, -column),
            Self::TopRight => (-column, layer, -row),
            Self::BottomRight => (-row, layer, column),
        }
    }

    /// Signed column, layer and row extents of a footprint under this
    /// orientation, measured from the anchor cell.
    #[must_use]
    pub fn extents(self, dimensions: GridDimensions) -> (i32, i32, i32) {
        let columns = to_delta(dimensions.columns());
        let layers = to_delta(dimensions.layers());
        let rows = to_delta(dimensions.rows());
        match self {
            Self::BottomLeft => (columns, layers, rows),
            Self::TopLeft => (rows, layers, -columns),
            Self::TopRight => (-columns, layers, -rows),
            Self::BottomRight => (-rows, layers, columns),
        }
    }
}

/// Rotation applied by one clockwise quarter turn seen from above.
///
/// The world is Y-up and right handed, so clockwise from above is a negative
/// angle around +Y.
#[must_use]
pub fn quarter_turn() -> Quat {
    Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2)
}

fn to_delta(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

/// Unique identifier assigned to an object placed on a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-directional slope joining two adjacent layers.
///
/// Travel enters from the lower end on the ramp's own layer and leaves through
/// the upper end one layer higher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RampDescriptor {
    upper: Direction,
    lower: Direction,
    upper_layer: i32,
    lower_layer: i32,
}

impl RampDescriptor {
    /// Creates a ramp on `layer` whose higher end faces `upper`.
    #[must_use]
    pub const fn new(upper: Direction, layer: i32) -> Self {
        Self {
            upper,
            lower: upper.opposite(),
            upper_layer: layer.saturating_add(1),
            lower_layer: layer,
        }
    }

    /// Direction of the ramp's higher end.
    #[must_use]
    pub const fn upper_direction(&self) -> Direction {
        self.upper
    }

    /// Direction of the ramp's lower end, always opposite the upper end.
    #[must_use]
    pub const fn lower_direction(&self) -> Direction {
        self.lower
    }

    /// Layer reached by leaving through the upper end.
    #[must_use]
    pub const fn upper_layer(&self) -> i32 {
        self.upper_layer
    }

    /// Layer reached by leaving through the lower end.
    #[must_use]
    pub const fn lower_layer(&self) -> i32 {
        self.lower_layer
    }

    /// Reports whether either end of the ramp lies strictly closer to
    /// `goal_layer` than `current_layer` does.
    #[must_use]
    pub fn approaches_layer(&self, current_layer: i32, goal_layer: i32) -> bool {
        let current = current_layer.abs_diff(goal_layer);
        self.upper_layer.abs_diff(goal_layer) < current
            || self.lower_layer.abs_diff(goal_layer) < current
    }
}

/// Events broadcast by a grid after processing placement and removal requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that an object now occupies its footprint.
    ObjectPlaced {
        /// Identifier assigned to the object by the grid.
        object: ObjectId,
        /// Anchor cell of the footprint.
        start: CellCoord,
        /// Orientation the footprint was resolved with.
        orientation: Orientation,
    },
    /// Confirms that an object left the grid.
    ObjectRemoved {
        /// Identifier of the removed object.
        object: ObjectId,
        /// Anchor cell the object occupied before removal.
        start: CellCoord,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Anchor cell provided in the request.
        start: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Identifier of the object targeted for removal.
        object: ObjectId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
}

/// Reasons a placement request may be rejected by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The anchor coordinate is neither inside the grid bounds nor a known cell.
    InvalidCoordinate,
    /// The footprint extends beyond the grid bounds.
    OutOfBounds,
    /// The footprint overlaps an occupied cell.
    Occupied,
}

/// Reasons a removal request may be rejected by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No placed object with the identifier exists, or it lacks a starting cell.
    NotPlaced,
    /// A footprint cell is held by a different occupant.
    Ambiguous,
    /// A cell detail failed while reacting to the removal.
    DetailHookFailed,
}
