//! A* search between two cells.

use plinth_core::CellCoord;
use plinth_world::{Cell, Grid};

use crate::{require_cell, PathTree, PathfindingError, Search};

/// Estimate guiding A* toward the goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// Manhattan distance across columns and rows.
    #[default]
    Planar,
    /// Manhattan distance across all three axes, discounted for ramps that
    /// lead toward the goal's layer.
    ElevationAware,
}

impl Heuristic {
    fn estimate(self, current: CellCoord, next: &Cell, goal: CellCoord) -> i64 {
        let coord = next.coord();
        let planar = i64::from(coord.planar_distance(goal));
        match self {
            Self::Planar => planar,
            Self::ElevationAware => {
                let vertical = i64::from(coord.layer().abs_diff(goal.layer()));
                let ramp_bonus = match next.ramp() {
                    Some(ramp)
                        if coord.layer() != goal.layer()
                            && ramp.approaches_layer(current.layer(), goal.layer()) =>
                    {
                        2
                    }
                    _ => 0,
                };
                planar + vertical - ramp_bonus
            }
        }
    }
}

/// Finds the cheapest route from `start` to `goal`.
///
/// Returns `Ok(None)` when the goal cannot be reached. With
/// `consider_navigability` set, both endpoints must be navigable and the
/// search never enters non-navigable cells.
pub fn find_path(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    heuristic: Heuristic,
    consider_navigability: bool,
) -> Result<Option<PathTree>, PathfindingError> {
    let start_cell = require_cell(grid, start)?;
    let goal_cell = require_cell(grid, goal)?;
    if consider_navigability {
        if !start_cell.is_navigable() {
            return Err(PathfindingError::StartNotNavigable(start));
        }
        if !goal_cell.is_navigable() {
            return Err(PathfindingError::GoalNotNavigable(goal));
        }
    }

    let mut search = Search::new(grid, start, consider_navigability);
    while let Some((current, cell, cost)) = search.pop() {
        if current == goal {
            return Ok(Some(PathTree {
                start,
                goal,
                came_from: search.came_from,
                costs: search.costs,
            }));
        }

        for (next, next_cell, next_cost) in search.expansions(cell, cost) {
            let priority = i64::try_from(next_cost)
                .unwrap_or(i64::MAX)
                .saturating_add(heuristic.estimate(current, next_cell, goal));
            let _improved = search.relax(current, next, next_cost, priority);
        }
    }

    tracing::debug!(?start, ?goal, "no path between cells");
    Ok(None)
}

/// Convenience wrapper returning the ordered cells of the cheapest route.
pub fn get_path(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    heuristic: Heuristic,
    consider_navigability: bool,
) -> Result<Option<Vec<CellCoord>>, PathfindingError> {
    let tree = find_path(grid, start, goal, heuristic, consider_navigability)?;
    Ok(tree.map(|tree| tree.path()))
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use plinth_core::{Direction, RampDescriptor};

    use super::*;

    fn flat(coord: CellCoord) -> Cell {
        Cell::new(coord, Vec3::ZERO, 1.0)
    }

    fn ramp(coord: CellCoord, upper: Direction) -> Cell {
        flat(coord).with_ramp(RampDescriptor::new(upper, coord.layer()))
    }

    #[test]
    fn ramps_toward_the_goal_layer_are_discounted() {
        let current = CellCoord::new(1, 0, 0);
        let goal = CellCoord::new(4, 1, 0);
        let next = CellCoord::new(2, 0, 0);

        assert_eq!(
            Heuristic::ElevationAware.estimate(current, &ramp(next, Direction::East), goal),
            1,
            "two planar steps plus one layer, minus the ramp discount"
        );
        assert_eq!(Heuristic::ElevationAware.estimate(current, &flat(next), goal), 3);
        assert_eq!(Heuristic::Planar.estimate(current, &ramp(next, Direction::East), goal), 2);
    }

    #[test]
    fn ramps_on_the_goal_layer_or_leading_away_are_not_discounted() {
        let next = CellCoord::new(2, 0, 0);
        assert_eq!(
            Heuristic::ElevationAware.estimate(
                CellCoord::new(1, 0, 0),
                &ramp(next, Direction::East),
                CellCoord::new(4, 0, 0),
            ),
            2
        );

        let high = CellCoord::new(2, 2, 0);
        assert_eq!(
            Heuristic::ElevationAware.estimate(
                CellCoord::new(1, 2, 0),
                &ramp(high, Direction::East),
                CellCoord::new(4, 0, 0),
            ),
            4,
            "a ramp climbing from layer 2 to 3 moves away from layer 0"
        );
    }
}
