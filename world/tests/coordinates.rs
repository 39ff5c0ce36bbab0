use glam::Vec3;
use plinth_core::{CellCoord, Direction, Orientation};
use plinth_world::{query, Cell, Grid, GridError, GridSettings};

fn grid() -> Grid {
    Grid::new(&GridSettings::new(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(8.0, 4.0, 6.0),
        2.0,
        1,
    ))
    .expect("valid grid")
}

#[test]
fn dimensions_come_from_the_bounding_volume() {
    let grid = grid();
    assert_eq!(grid.origin(), Vec3::new(-4.0, 0.0, -3.0));
    assert_eq!((grid.columns(), grid.layers(), grid.rows()), (4, 2, 3));
}

#[test]
fn world_points_resolve_to_containing_cells() {
    let grid = grid();
    assert_eq!(
        grid.world_to_coordinate(Vec3::new(-4.0, 0.0, -3.0)),
        Some(CellCoord::new(0, 0, 0))
    );
    assert_eq!(
        grid.world_to_coordinate(Vec3::new(1.9, 2.5, 2.9)),
        Some(CellCoord::new(2, 1, 2))
    );
    assert_eq!(
        grid.world_to_coordinate(Vec3::new(0.0, 1.96, 0.0)),
        Some(CellCoord::new(2, 1, 1)),
        "heights within rounding noise of a layer floor belong to that layer"
    );
}

#[test]
fn points_outside_the_bounds_have_no_coordinate() {
    let grid = grid();
    assert_eq!(grid.world_to_coordinate(Vec3::new(-4.1, 0.0, 0.0)), None);
    assert_eq!(grid.world_to_coordinate(Vec3::new(4.0, 0.0, 0.0)), None);
    assert_eq!(grid.world_to_coordinate(Vec3::new(0.0, 4.0, 0.0)), None);
    assert_eq!(grid.world_to_coordinate(Vec3::new(0.0, -0.5, 0.0)), None);
    assert!(grid.cell_at_world(Vec3::new(100.0, 0.0, 0.0)).is_none());
}

#[test]
fn coordinate_to_world_applies_the_anchor_corner() {
    let grid = grid();
    let coord = CellCoord::new(1, 0, 1);
    let cases = [
        (Orientation::BottomLeft, Vec3::new(-2.0, 0.0, -1.0)),
        (Orientation::TopLeft, Vec3::new(-2.0, 0.0, 1.0)),
        (Orientation::TopRight, Vec3::new(0.0, 0.0, 1.0)),
        (Orientation::BottomRight, Vec3::new(0.0, 0.0, -1.0)),
    ];
    for (orientation, expected) in cases {
        assert_eq!(grid.coordinate_to_world(coord, orientation), Some(expected));
    }
    assert_eq!(
        grid.coordinate_to_world(CellCoord::new(9, 0, 0), Orientation::BottomLeft),
        None
    );
}

#[test]
fn validity_covers_dense_bounds_only_for_dense_grids() {
    let grid = grid();
    assert!(grid.is_valid_coordinate(CellCoord::new(3, 1, 2)));
    assert!(!grid.is_valid_coordinate(CellCoord::new(4, 0, 0)));
    assert!(!grid.is_valid_coordinate(CellCoord::new(0, -1, 0)));
}

#[test]
fn cell_centers_sit_mid_cell() {
    let grid = grid();
    let cell = grid.cell(CellCoord::new(0, 1, 0)).expect("cell exists");
    assert_eq!(cell.origin(), Vec3::new(-4.0, 2.0, -3.0));
    assert_eq!(cell.center(), Vec3::new(-3.0, 2.0, -2.0));
}

#[test]
fn invalid_settings_fail_construction() {
    let negative = GridSettings::new(Vec3::ZERO, Vec3::ONE, 1.0, -2);
    assert_eq!(
        Grid::new(&negative).expect_err("negative layers"),
        GridError::NegativeLayerMax(-2)
    );
    let flat = GridSettings::new(Vec3::ZERO, Vec3::ONE, -1.0, 0);
    assert!(matches!(
        Grid::new(&flat),
        Err(GridError::InvalidCellSize(size)) if size < 0.0
    ));
}

#[test]
fn uniform_grids_link_cells_both_ways() {
    let mut grid = grid();
    let a = CellCoord::new(1, 0, 1);
    let b = CellCoord::new(2, 0, 1);
    assert!(grid.is_reciprocal(a, b));
    assert!(!grid.is_reciprocal(a, CellCoord::new(1, 1, 1)));
    assert_eq!(grid.cell(CellCoord::new(0, 0, 0)).map(|cell| cell.neighbors().count()), Some(2));

    grid.disconnect_both_ways(a, b);
    assert!(!grid.cell(a).is_some_and(|cell| cell.has_neighbor(b)));
    assert!(!grid.cell(b).is_some_and(|cell| cell.has_neighbor(a)));

    assert!(grid.connect_both_ways(a, b));
    assert!(grid.is_reciprocal(a, b));
    assert!(!grid.connect_both_ways(a, CellCoord::new(-1, 0, 1)));
}

#[test]
fn cell_neighbor_can_require_an_edge() {
    let mut grid = grid();
    let a = CellCoord::new(1, 0, 1);
    grid.disconnect_both_ways(a, CellCoord::new(1, 0, 2));
    assert!(query::cell_neighbor(&grid, a, Direction::North, false).is_some());
    assert!(query::cell_neighbor(&grid, a, Direction::North, true).is_none());
    assert_eq!(
        query::cell_neighbor(&grid, a, Direction::East, true).map(Cell::coord),
        Some(CellCoord::new(2, 0, 1))
    );
}

#[test]
fn factories_customise_cells() {
    let settings = GridSettings::anchored_at_origin(3, 3, 1, 1.0);
    let grid = Grid::with_factory(&settings, |coord, origin, size| {
        let cell = Cell::new(coord, origin, size);
        if coord.column() == 1 {
            cell.with_cost(4).with_navigable(false)
        } else {
            cell
        }
    })
    .expect("valid grid");

    let wall = grid.cell(CellCoord::new(1, 0, 2)).expect("cell exists");
    assert!(!wall.is_navigable());
    assert_eq!(wall.cost_to_enter(CellCoord::new(0, 0, 2)), 4);
    assert!(grid.cell(CellCoord::new(2, 0, 2)).is_some_and(Cell::is_navigable));
}
