use glam::Vec3;
use plinth_core::{CellCoord, Direction};
use plinth_world::{
    detect_ramp, Connectivity, Footprint, Grid, GridSettings, ProjectionSettings, RampError,
    SurfaceHit, SurfaceId, SurfaceProbe, SurfaceScene,
};

fn projection() -> ProjectionSettings {
    ProjectionSettings {
        cast_through_all: false,
        start_height: 10.0,
        lowest_height: -10.0,
    }
}

/// Floor at height 0 for columns 0..2, an east-rising ramp in column 2 and a
/// platform at height 1 for columns 3..5, two rows deep.
fn terrace() -> SurfaceScene {
    SurfaceScene::new()
        .with_slab(Footprint::new(0.0, 0.0, 2.0, 2.0), 0.0)
        .with_ramp(Footprint::new(2.0, 0.0, 3.0, 2.0), 0.0, 1.0, Direction::East)
        .with_slab(Footprint::new(3.0, 0.0, 5.0, 2.0), 1.0)
}

fn terrace_grid() -> Grid {
    Grid::projected(
        &GridSettings::anchored_at_origin(5, 2, 2, 1.0),
        &projection(),
        &terrace(),
    )
    .expect("terrace projects cleanly")
}

fn ramp_hit(scene: &SurfaceScene, x: f32, z: f32) -> (SurfaceHit, Vec3) {
    let origin = Vec3::new(x, 10.0, z);
    let hit = scene.cast_down(origin, 20.0).expect("ramp below");
    (hit, origin)
}

#[test]
fn ramp_directions_follow_the_rising_edge() {
    for upper in Direction::ALL {
        let scene = SurfaceScene::new().with_ramp(
            Footprint::new(0.0, 0.0, 1.0, 1.0),
            0.0,
            1.0,
            upper,
        );
        let (hit, origin) = ramp_hit(&scene, 0.5, 0.5);
        let ramp = detect_ramp(&hit, origin, 1.0, 0, &scene).expect("sloped surface");
        assert_eq!(ramp.upper_direction(), upper);
        assert_eq!(ramp.lower_direction(), upper.opposite());
        assert_eq!((ramp.lower_layer(), ramp.upper_layer()), (0, 1));
    }
}

#[test]
fn flat_surfaces_are_not_ramps() {
    let scene = SurfaceScene::new().with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 0.0);
    let (hit, origin) = ramp_hit(&scene, 0.5, 0.5);
    assert_eq!(
        detect_ramp(&hit, origin, 1.0, 0, &scene),
        Err(RampError::FlatSurface)
    );
}

#[test]
fn slopes_that_cannot_be_resampled_are_indeterminate() {
    let scene = SurfaceScene::new();
    let hit = SurfaceHit {
        point: Vec3::new(0.5, 0.5, 0.5),
        normal: Vec3::new(-1.0, 1.0, 0.0).normalize(),
        surface: SurfaceId::new(0),
    };
    assert!(matches!(
        detect_ramp(&hit, Vec3::new(0.5, 10.0, 0.5), 1.0, 0, &scene),
        Err(RampError::Indeterminate(_))
    ));
}

#[test]
fn projection_places_cells_on_surface_layers() {
    let grid = terrace_grid();
    assert_eq!(grid.connectivity(), Connectivity::ProjectedSurface);
    assert_eq!(grid.cell_count(), 10);

    let ramp = grid.cell(CellCoord::new(2, 0, 0)).expect("ramp cell");
    assert_eq!(ramp.ramp().map(|ramp| ramp.upper_direction()), Some(Direction::East));
    assert_eq!(ramp.origin(), Vec3::new(2.0, 0.0, 0.0));

    let platform = grid.cell(CellCoord::new(4, 1, 1)).expect("platform cell");
    assert!(platform.ramp().is_none());
    assert_eq!(platform.origin(), Vec3::new(4.0, 1.0, 1.0));
    assert!(grid.cell(CellCoord::new(4, 0, 1)).is_none());
}

#[test]
fn ramps_connect_only_along_their_slope() {
    let grid = terrace_grid();
    let floor = CellCoord::new(1, 0, 0);
    let ramp = CellCoord::new(2, 0, 0);
    let platform = CellCoord::new(3, 1, 0);
    let neighbors = |coord| {
        grid.cell(coord)
            .expect("cell exists")
            .neighbors()
            .collect::<Vec<_>>()
    };

    assert!(neighbors(floor).contains(&ramp));
    assert_eq!(neighbors(ramp), vec![floor, platform]);
    assert!(neighbors(platform).contains(&ramp), "platform descends onto the ramp");
    assert!(!neighbors(CellCoord::new(2, 0, 1)).contains(&ramp));
    assert!(!grid.is_reciprocal(ramp, CellCoord::new(2, 0, 1)));
    assert!(grid.is_reciprocal(floor, ramp));
    assert!(grid.is_reciprocal(ramp, platform));
}

#[test]
fn flat_cells_do_not_enter_ramps_from_the_side() {
    let scene = SurfaceScene::new()
        .with_slab(Footprint::new(0.0, 0.0, 3.0, 1.0), 0.0)
        .with_ramp(Footprint::new(1.0, 1.0, 2.0, 2.0), 0.0, 1.0, Direction::East)
        .with_slab(Footprint::new(0.0, 1.0, 1.0, 2.0), 0.0);
    let grid = Grid::projected(
        &GridSettings::anchored_at_origin(3, 2, 2, 1.0),
        &projection(),
        &scene,
    )
    .expect("scene projects cleanly");

    let ramp = CellCoord::new(1, 0, 1);
    let south = CellCoord::new(1, 0, 0);
    let west = CellCoord::new(0, 0, 1);
    assert!(!grid.cell(south).is_some_and(|cell| cell.has_neighbor(ramp)));
    assert!(grid.cell(west).is_some_and(|cell| cell.has_neighbor(ramp)));
}

#[test]
fn casting_through_all_surfaces_stacks_cells() {
    let scene = SurfaceScene::new()
        .with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 0.0)
        .with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 3.0);
    let settings = GridSettings::anchored_at_origin(1, 1, 4, 1.0);

    let single = Grid::projected(&settings, &projection(), &scene).expect("projects");
    assert_eq!(single.coords(), vec![CellCoord::new(0, 3, 0)]);

    let stacked = Grid::projected(
        &settings,
        &ProjectionSettings {
            cast_through_all: true,
            ..projection()
        },
        &scene,
    )
    .expect("projects");
    assert_eq!(
        stacked.coords(),
        vec![CellCoord::new(0, 0, 0), CellCoord::new(0, 3, 0)]
    );
}

#[test]
fn surfaces_within_a_cell_of_the_one_above_are_skipped() {
    let scene = SurfaceScene::new()
        .with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 3.0)
        .with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 2.5)
        .with_slab(Footprint::new(0.0, 0.0, 1.0, 1.0), 0.0);
    let grid = Grid::projected(
        &GridSettings::anchored_at_origin(1, 1, 4, 1.0),
        &ProjectionSettings {
            cast_through_all: true,
            ..projection()
        },
        &scene,
    )
    .expect("projects");
    assert_eq!(
        grid.coords(),
        vec![CellCoord::new(0, 0, 0), CellCoord::new(0, 3, 0)]
    );
}
