//! Scenario files describing a grid, the objects placed on it and the
//! queries answered against the result.

use std::{collections::BTreeSet, fmt, fs, path::Path};

use anyhow::{bail, Context, Result};
use plinth_core::{CellCoord, Event, GridDimensions, ObjectId, Orientation};
use plinth_system_pathfinding::{find_all_cells_within_cost, find_path, Heuristic};
use plinth_world::{
    Connectivity, Grid, GridObject, GridSettings, ProjectionSettings, SurfaceScene, SurfaceShape,
};
use serde::Deserialize;

/// Complete scenario loaded from TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    grid: GridSettings,
    #[serde(default)]
    projection: Option<ProjectionSettings>,
    #[serde(default)]
    surfaces: Vec<SurfaceShape>,
    #[serde(default)]
    blocked: Vec<CellCoord>,
    #[serde(default)]
    costs: Vec<CostOverride>,
    #[serde(default)]
    placements: Vec<PlacementRequest>,
    #[serde(default)]
    removals: Vec<RemovalRequest>,
    #[serde(default)]
    paths: Vec<PathRequest>,
    #[serde(default)]
    reachability: Vec<ReachRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CostOverride {
    cell: CellCoord,
    cost: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlacementRequest {
    start: CellCoord,
    dimensions: GridDimensions,
    #[serde(default)]
    orientation: Orientation,
    #[serde(default)]
    force: bool,
    #[serde(default = "enabled")]
    blocks_navigation: bool,
}

/// Removes the object created by the placement at `placement` (zero based).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemovalRequest {
    placement: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathRequest {
    start: CellCoord,
    goal: CellCoord,
    #[serde(default)]
    heuristic: HeuristicChoice,
    #[serde(default = "enabled")]
    consider_navigability: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReachRequest {
    start: CellCoord,
    max_cost: u64,
    #[serde(default)]
    include_start: bool,
    #[serde(default = "enabled")]
    consider_navigability: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum HeuristicChoice {
    #[default]
    Planar,
    ElevationAware,
}

impl From<HeuristicChoice> for Heuristic {
    fn from(choice: HeuristicChoice) -> Self {
        match choice {
            HeuristicChoice::Planar => Self::Planar,
            HeuristicChoice::ElevationAware => Self::ElevationAware,
        }
    }
}

fn enabled() -> bool {
    true
}

impl Scenario {
    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses a scenario from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("scenario is not valid TOML for a plinth scenario")
    }

    /// Builds the grid and answers every request in file order: placements,
    /// then removals, then path and reachability queries.
    pub(crate) fn run(&self) -> Result<Report> {
        let mut grid = self.build_grid()?;
        let mut events = Vec::new();

        let mut placed: Vec<Option<Placed>> = Vec::with_capacity(self.placements.len());
        for request in &self.placements {
            placed.push(place(&mut grid, request, &mut events));
        }

        for (index, removal) in self.removals.iter().enumerate() {
            if removal.placement >= self.placements.len() {
                bail!(
                    "removal {index} names placement {} but only {} exist",
                    removal.placement,
                    self.placements.len()
                );
            }
            let Some(entry) = placed.get_mut(removal.placement).and_then(Option::take) else {
                tracing::warn!(
                    placement = removal.placement,
                    "skipping removal of a rejected or already removed placement"
                );
                continue;
            };
            if grid.try_remove(entry.id, &mut events).is_ok() {
                for coord in entry.closed {
                    let _reopened = grid.set_navigable(coord, true);
                }
            }
        }

        let mut paths = Vec::with_capacity(self.paths.len());
        for (index, request) in self.paths.iter().enumerate() {
            let tree = find_path(
                &grid,
                request.start,
                request.goal,
                request.heuristic.into(),
                request.consider_navigability,
            )
            .with_context(|| format!("path query {index} cannot start"))?;
            let route = tree.and_then(|tree| {
                let cost = tree.cost_to(request.goal)?;
                Some((tree.path(), cost))
            });
            paths.push(PathOutcome {
                start: request.start,
                goal: request.goal,
                route,
            });
        }

        let mut reachability = Vec::with_capacity(self.reachability.len());
        for (index, request) in self.reachability.iter().enumerate() {
            let cells = find_all_cells_within_cost(
                &grid,
                request.start,
                request.max_cost,
                request.include_start,
                request.consider_navigability,
            )
            .with_context(|| format!("reachability query {index} cannot start"))?;
            reachability.push(ReachOutcome {
                start: request.start,
                max_cost: request.max_cost,
                cells,
            });
        }

        Ok(Report {
            summary: GridSummary::of(&grid),
            events,
            paths,
            reachability,
        })
    }

    fn build_grid(&self) -> Result<Grid> {
        let mut grid = match &self.projection {
            Some(projection) => {
                let mut scene = SurfaceScene::new();
                for shape in &self.surfaces {
                    let _id = scene.add(*shape);
                }
                Grid::projected(&self.grid, projection, &scene)
            }
            None => {
                if !self.surfaces.is_empty() {
                    tracing::warn!(
                        count = self.surfaces.len(),
                        "surfaces are ignored without a [projection] table"
                    );
                }
                Grid::new(&self.grid)
            }
        }
        .context("failed to build grid")?;

        for coord in &self.blocked {
            if !grid.set_navigable(*coord, false) {
                tracing::warn!(?coord, "blocked cell does not exist");
            }
        }
        for CostOverride { cell, cost } in &self.costs {
            match grid.cell_mut(*cell) {
                Some(target) => target.set_cost(*cost),
                None => tracing::warn!(coord = ?cell, "cost override names a missing cell"),
            }
        }
        Ok(grid)
    }
}

/// Placed object and the cells it closed to pathfinding.
#[derive(Debug)]
struct Placed {
    id: ObjectId,
    closed: Vec<CellCoord>,
}

fn place(grid: &mut Grid, request: &PlacementRequest, events: &mut Vec<Event>) -> Option<Placed> {
    let object = GridObject::new(request.dimensions).with_orientation(request.orientation);
    let id = grid
        .try_place(object, request.start, request.force, events)
        .ok()?;
    let mut closed = Vec::new();
    if request.blocks_navigation {
        for (coord, _) in grid.footprint(request.dimensions, request.orientation, request.start) {
            if grid.cell(coord).is_some_and(|cell| cell.is_navigable()) {
                let _changed = grid.set_navigable(coord, false);
                closed.push(coord);
            }
        }
    }
    Some(Placed { id, closed })
}

/// Outcome of running a scenario.
#[derive(Debug)]
pub(crate) struct Report {
    summary: GridSummary,
    events: Vec<Event>,
    paths: Vec<PathOutcome>,
    reachability: Vec<ReachOutcome>,
}

#[derive(Debug)]
struct GridSummary {
    cells: usize,
    columns: i32,
    layers: i32,
    rows: i32,
    connectivity: Connectivity,
}

impl GridSummary {
    fn of(grid: &Grid) -> Self {
        Self {
            cells: grid.cell_count(),
            columns: grid.columns(),
            layers: grid.layers(),
            rows: grid.rows(),
            connectivity: grid.connectivity(),
        }
    }
}

#[derive(Debug)]
struct PathOutcome {
    start: CellCoord,
    goal: CellCoord,
    route: Option<(Vec<CellCoord>, u64)>,
}

#[derive(Debug)]
struct ReachOutcome {
    start: CellCoord,
    max_cost: u64,
    cells: BTreeSet<CellCoord>,
}

struct Coord(CellCoord);

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.column(), self.0.layer(), self.0.row())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let GridSummary {
            cells,
            columns,
            layers,
            rows,
            connectivity,
        } = &self.summary;
        writeln!(
            f,
            "grid: {cells} cells in {columns}x{layers}x{rows} ({connectivity:?})"
        )?;

        for event in &self.events {
            match event {
                Event::ObjectPlaced {
                    object,
                    start,
                    orientation,
                } => writeln!(
                    f,
                    "placed object {} at {} facing {orientation:?}",
                    object.get(),
                    Coord(*start)
                )?,
                Event::ObjectRemoved { object, start } => {
                    writeln!(f, "removed object {} from {}", object.get(), Coord(*start))?;
                }
                Event::PlacementRejected { start, reason } => {
                    writeln!(f, "rejected placement at {}: {reason:?}", Coord(*start))?;
                }
                Event::RemovalRejected { object, reason } => {
                    writeln!(f, "rejected removal of object {}: {reason:?}", object.get())?;
                }
            }
        }

        for outcome in &self.paths {
            write!(f, "path {} -> {}: ", Coord(outcome.start), Coord(outcome.goal))?;
            match &outcome.route {
                Some((cells, cost)) => {
                    write!(f, "{} cells, cost {cost}:", cells.len())?;
                    for cell in cells {
                        write!(f, " {}", Coord(*cell))?;
                    }
                    writeln!(f)?;
                }
                None => writeln!(f, "unreachable")?,
            }
        }

        for outcome in &self.reachability {
            writeln!(
                f,
                "reachable from {} within {}: {} cells",
                Coord(outcome.start),
                outcome.max_cost,
                outcome.cells.len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURTYARD: &str = include_str!("../scenarios/courtyard.toml");
    const TERRACE: &str = include_str!("../scenarios/terrace.toml");

    #[test]
    fn courtyard_routes_around_the_wall() {
        let report = Scenario::parse(COURTYARD)
            .expect("courtyard parses")
            .run()
            .expect("courtyard runs");

        assert_eq!(report.summary.cells, 25);
        assert!(matches!(
            report.events.as_slice(),
            [
                Event::ObjectPlaced { .. },
                Event::PlacementRejected {
                    reason: plinth_core::PlacementError::Occupied,
                    ..
                },
                ..
            ]
        ));

        let (path, cost) = report.paths[0].route.clone().expect("wall can be bypassed");
        assert_eq!(path.len(), 9);
        assert_eq!(cost, 8);
        assert!(!path.contains(&CellCoord::new(2, 0, 2)), "wall blocks the direct route");

        assert_eq!(report.reachability[0].cells.len(), 8);
    }

    #[test]
    fn removals_reopen_the_footprint() {
        let mut scenario = Scenario::parse(COURTYARD).expect("courtyard parses");
        scenario.removals.push(RemovalRequest { placement: 0 });
        let report = scenario.run().expect("courtyard runs");

        assert!(report
            .events
            .iter()
            .any(|event| matches!(event, Event::ObjectRemoved { .. })));
        let (path, cost) = report.paths[0].route.clone().expect("open courtyard");
        assert_eq!((path.len(), cost), (5, 4));
    }

    #[test]
    fn removals_keep_blocked_cells_closed() {
        let mut scenario = Scenario::parse(COURTYARD).expect("courtyard parses");
        let wall_middle = CellCoord::new(2, 0, 2);
        scenario.blocked.push(wall_middle);
        scenario.removals.push(RemovalRequest { placement: 0 });
        let report = scenario.run().expect("courtyard runs");

        let (path, cost) = report.paths[0].route.clone().expect("detour around the blocked cell");
        assert!(!path.contains(&wall_middle), "blocked cell stays closed after removal");
        assert_eq!((path.len(), cost), (7, 6));
    }

    #[test]
    fn repeated_removal_is_skipped() {
        let mut scenario = Scenario::parse(COURTYARD).expect("courtyard parses");
        scenario.removals.push(RemovalRequest { placement: 0 });
        scenario.removals.push(RemovalRequest { placement: 0 });
        let report = scenario.run().expect("courtyard runs");

        let removed = report
            .events
            .iter()
            .filter(|event| matches!(event, Event::ObjectRemoved { .. }))
            .count();
        assert_eq!(removed, 1);
    }

    #[test]
    fn removal_of_an_unknown_placement_fails() {
        let mut scenario = Scenario::parse(COURTYARD).expect("courtyard parses");
        scenario.removals.push(RemovalRequest { placement: 9 });
        assert!(scenario.run().is_err());
    }

    #[test]
    fn terrace_climbs_the_ramp() {
        let report = Scenario::parse(TERRACE)
            .expect("terrace parses")
            .run()
            .expect("terrace runs");

        assert_eq!(report.summary.connectivity, Connectivity::ProjectedSurface);
        assert_eq!(report.summary.cells, 10);
        let (path, _) = report.paths[0].route.clone().expect("ramp joins the layers");
        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&CellCoord::new(4, 1, 1)));
        assert!(report.to_string().contains("ProjectedSurface"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = format!("{COURTYARD}\nunexpected = 1\n");
        assert!(Scenario::parse(&text).is_err());
    }

    #[test]
    fn queries_from_missing_cells_report_context() {
        let text = r#"
            [grid]
            center = [1.0, 0.0, 1.0]
            size = [2.0, 1.0, 2.0]
            cell_size = 1.0
            y_axis_max = 0

            [[paths]]
            start = { column = 0, layer = 0, row = 0 }
            goal = { column = 5, layer = 0, row = 5 }
        "#;
        let error = Scenario::parse(text)
            .expect("parses")
            .run()
            .expect_err("goal is missing");
        assert!(format!("{error:#}").contains("path query 0"));
    }
}
