//! Neighbour graph construction strategies.

use std::collections::HashMap;

use plinth_core::{CellCoord, Direction};
use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// Strategy used to derive each cell's directed neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Every cell links to its existing north, east, south and west
    /// neighbours on the same layer.
    #[default]
    Uniform,
    /// Flat cells link across their layer while ramps only link along their
    /// slope, moving up or down a layer.
    ProjectedSurface,
}

/// Directed edges produced by `connectivity`, ordered by source coordinate.
pub(crate) fn edges(
    connectivity: Connectivity,
    cells: &HashMap<CellCoord, Cell>,
) -> Vec<(CellCoord, CellCoord)> {
    let mut sources: Vec<&Cell> = cells.values().collect();
    sources.sort_by_key(|cell| cell.coord());

    let mut edges = Vec::new();
    for cell in sources {
        let coord = cell.coord();
        match (connectivity, cell.ramp()) {
            (Connectivity::Uniform, _) => {
                for direction in Direction::ALL {
                    let target = coord.step(direction);
                    if cells.contains_key(&target) {
                        edges.push((coord, target));
                    }
                }
            }
            (Connectivity::ProjectedSurface, None) => {
                for direction in Direction::ALL {
                    approach(cells, coord, coord.step(direction), direction, &mut edges);
                }
            }
            (Connectivity::ProjectedSurface, Some(ramp)) => {
                let upper = ramp.upper_direction();
                let lower = ramp.lower_direction();
                approach(cells, coord, coord.step(upper).above(), upper, &mut edges);
                approach(cells, coord, coord.step(lower), lower, &mut edges);
            }
        }
    }
    edges
}

/// Links `from` to `target` when entering it while travelling `direction` is
/// allowed, falling back to a descending ramp one layer below.
fn approach(
    cells: &HashMap<CellCoord, Cell>,
    from: CellCoord,
    target: CellCoord,
    direction: Direction,
    edges: &mut Vec<(CellCoord, CellCoord)>,
) {
    match cells.get(&target) {
        Some(candidate) => {
            let enterable = candidate
                .ramp()
                .map_or(true, |ramp| ramp.upper_direction() == direction);
            if enterable {
                edges.push((from, target));
            }
        }
        None => {
            let below = target.below();
            let descends = cells
                .get(&below)
                .and_then(Cell::ramp)
                .is_some_and(|ramp| ramp.lower_direction() == direction);
            if descends {
                edges.push((from, below));
            }
        }
    }
}
