//! Cost-bounded reachability.

use std::collections::{BTreeMap, BTreeSet};

use plinth_core::CellCoord;
use plinth_world::Grid;

use crate::{require_cell, PathfindingError, Search};

/// Cheapest cost of every cell reachable from `start` within `max_cost`.
///
/// The start is always included at cost zero.
pub fn costs_within(
    grid: &Grid,
    start: CellCoord,
    max_cost: u64,
    consider_navigability: bool,
) -> Result<BTreeMap<CellCoord, u64>, PathfindingError> {
    let start_cell = require_cell(grid, start)?;
    if consider_navigability && !start_cell.is_navigable() {
        return Err(PathfindingError::StartNotNavigable(start));
    }

    let mut search = Search::new(grid, start, consider_navigability);
    while let Some((current, cell, cost)) = search.pop() {
        for (next, _, next_cost) in search.expansions(cell, cost) {
            if next_cost > max_cost {
                continue;
            }
            let priority = i64::try_from(next_cost).unwrap_or(i64::MAX);
            let _improved = search.relax(current, next, next_cost, priority);
        }
    }

    Ok(search.costs.into_iter().collect())
}

/// Every cell reachable from `start` for at most `max_cost`.
pub fn find_all_cells_within_cost(
    grid: &Grid,
    start: CellCoord,
    max_cost: u64,
    include_start: bool,
    consider_navigability: bool,
) -> Result<BTreeSet<CellCoord>, PathfindingError> {
    let mut cells: BTreeSet<CellCoord> = costs_within(grid, start, max_cost, consider_navigability)?
        .into_keys()
        .collect();
    if !include_start {
        let _removed = cells.remove(&start);
    }
    Ok(cells)
}
