#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shortest-path and reachability searches over a Plinth grid.
//!
//! Searches walk the directed neighbour edges stored on each cell and charge
//! the destination cell's entry cost for every step. [`find_path`] runs A*
//! with either a planar or an elevation-aware heuristic, while
//! [`find_all_cells_within_cost`] floods outward with Dijkstra's algorithm.

mod astar;
mod flood;

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use plinth_core::CellCoord;
use plinth_world::{Cell, Grid};
use thiserror::Error;

pub use astar::{find_path, get_path, Heuristic};
pub use flood::{costs_within, find_all_cells_within_cost};

/// Preconditions that prevent a search from starting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathfindingError {
    /// No cell exists at the coordinate.
    #[error("no cell exists at {0:?}")]
    MissingCell(CellCoord),
    /// The start cell is not navigable.
    #[error("start cell {0:?} is not navigable")]
    StartNotNavigable(CellCoord),
    /// The goal cell is not navigable.
    #[error("goal cell {0:?} is not navigable")]
    GoalNotNavigable(CellCoord),
}

/// Predecessor map produced by a successful search.
#[derive(Clone, Debug)]
pub struct PathTree {
    start: CellCoord,
    goal: CellCoord,
    came_from: HashMap<CellCoord, CellCoord>,
    costs: HashMap<CellCoord, u64>,
}

impl PathTree {
    /// Cell the search started from.
    #[must_use]
    pub const fn start(&self) -> CellCoord {
        self.start
    }

    /// Cell the search reached.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Cheapest known cost from the start to `coord`.
    #[must_use]
    pub fn cost_to(&self, coord: CellCoord) -> Option<u64> {
        self.costs.get(&coord).copied()
    }

    /// Cell visited immediately before `coord`.
    #[must_use]
    pub fn predecessor(&self, coord: CellCoord) -> Option<CellCoord> {
        self.came_from.get(&coord).copied()
    }

    /// Ordered cells from the start to `target`, both inclusive.
    #[must_use]
    pub fn path_to(&self, target: CellCoord) -> Option<Vec<CellCoord>> {
        if target != self.start && !self.came_from.contains_key(&target) {
            return None;
        }

        let mut path = vec![target];
        let mut current = target;
        while current != self.start {
            current = self.predecessor(current)?;
            path.push(current);
            if path.len() > self.came_from.len() + 1 {
                tracing::error!(?target, "predecessor chain does not lead back to the start");
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    /// Ordered cells from the start to the goal.
    #[must_use]
    pub fn path(&self) -> Vec<CellCoord> {
        self.path_to(self.goal).unwrap_or_default()
    }
}

/// Frontier entry ordered so the binary heap pops the lowest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frontier {
    priority: i64,
    coord: CellCoord,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra state shared by both searches.
#[derive(Debug)]
struct Search<'a> {
    grid: &'a Grid,
    consider_navigability: bool,
    frontier: BinaryHeap<Frontier>,
    came_from: HashMap<CellCoord, CellCoord>,
    costs: HashMap<CellCoord, u64>,
}

impl<'a> Search<'a> {
    fn new(grid: &'a Grid, start: CellCoord, consider_navigability: bool) -> Self {
        let mut search = Self {
            grid,
            consider_navigability,
            frontier: BinaryHeap::new(),
            came_from: HashMap::new(),
            costs: HashMap::new(),
        };
        let _previous = search.costs.insert(start, 0);
        search.frontier.push(Frontier {
            priority: 0,
            coord: start,
        });
        search
    }

    fn pop(&mut self) -> Option<(CellCoord, &'a Cell, u64)> {
        loop {
            let Frontier { coord, .. } = self.frontier.pop()?;
            let (Some(cell), Some(cost)) = (self.grid.cell(coord), self.costs.get(&coord)) else {
                continue;
            };
            return Some((coord, cell, *cost));
        }
    }

    /// Neighbours of `cell` the search may step into, with the cost of
    /// reaching each through `cell`.
    fn expansions(&self, cell: &'a Cell, cost: u64) -> Vec<(CellCoord, &'a Cell, u64)> {
        cell.neighbors()
            .filter_map(|next| {
                let next_cell = self.grid.cell(next)?;
                if self.consider_navigability && !next_cell.is_navigable() {
                    return None;
                }
                let step = u64::from(next_cell.cost_to_enter(cell.coord()));
                Some((next, next_cell, cost.saturating_add(step)))
            })
            .collect()
    }

    /// Records `cost` for `next` when it improves on the best known cost.
    fn relax(&mut self, from: CellCoord, next: CellCoord, cost: u64, priority: i64) -> bool {
        if self.costs.get(&next).is_some_and(|&known| cost >= known) {
            return false;
        }
        let _previous_cost = self.costs.insert(next, cost);
        let _previous_step = self.came_from.insert(next, from);
        self.frontier.push(Frontier {
            priority,
            coord: next,
        });
        true
    }
}

fn require_cell(grid: &Grid, coord: CellCoord) -> Result<&Cell, PathfindingError> {
    grid.cell(coord).ok_or(PathfindingError::MissingCell(coord))
}
