// Path search engine
//
// A* over the 6-connected lattice. Every queue entry carries the direction of the
// first move out of the origin, so the answer is known the moment the target is
// popped. The full path is rebuilt from a parent map for reuse on later ticks.
//
// The search is cooperative: the deadline and the iteration cap are checked before
// each expansion and the search gives up cleanly when either trips.

use log::debug;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::config::{HeuristicKind, SearchConfig};
use crate::grid::Grid;
use crate::scheduler::Deadline;
use crate::types::{Cell, Direction};

/// Ordered cells from an agent's position to the end of a plan, both ends included
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    cells: Vec<Cell>,
}

impl Path {
    pub fn new(cells: Vec<Cell>) -> Self {
        Path { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of moves along the path
    pub fn len(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn origin(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    pub fn end(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    pub fn first_step(&self) -> Option<Direction> {
        match self.cells.as_slice() {
            [from, to, ..] => from.direction_to(to),
            _ => None,
        }
    }

    /// Keeps at most `steps` moves from the origin
    pub fn truncated(&self, steps: usize) -> Path {
        Path::new(self.cells.iter().take(steps + 1).copied().collect())
    }

    /// Remainder of the path starting at `cell`, if the path passes through it
    pub fn suffix_from(&self, cell: &Cell) -> Option<Path> {
        let start = self.cells.iter().position(|c| c == cell)?;
        Some(Path::new(self.cells[start..].to_vec()))
    }
}

/// A converged search: the move to make now and the plan behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub first_step: Direction,
    pub path: Path,
}

/// How a search ended
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Route),
    /// Origin already is the target; there is no move to make
    AtTarget,
    /// Queue exhausted, or the target itself is blocked
    Unreachable,
    /// Deadline reached before convergence
    Interrupted,
    IterationCapReached,
}

impl SearchOutcome {
    pub fn route(self) -> Option<Route> {
        match self {
            SearchOutcome::Found(route) => Some(route),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchOutcome::Found(_) => "found",
            SearchOutcome::AtTarget => "at-target",
            SearchOutcome::Unreachable => "unreachable",
            SearchOutcome::Interrupted => "interrupted",
            SearchOutcome::IterationCapReached => "iteration-cap",
        }
    }
}

/// Configuration axes of the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    pub heuristic: HeuristicKind,
    /// Weight of the distance-to-center term added to the heuristic; 0 disables it
    pub center_weight: f64,
    pub max_iterations: usize,
    /// Moves kept from a path toward the map center
    pub centering_path_cap: usize,
}

impl SearchPolicy {
    pub fn from_config(config: &SearchConfig) -> Self {
        SearchPolicy {
            heuristic: config.heuristic,
            center_weight: config.center_weight,
            max_iterations: config.max_iterations,
            centering_path_cap: config.centering_path_cap,
        }
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        SearchPolicy {
            heuristic: HeuristicKind::Manhattan,
            center_weight: 0.0,
            max_iterations: 1_000_000,
            centering_path_cap: 5,
        }
    }
}

fn distance(kind: HeuristicKind, cell: &Cell, point: [f64; 3]) -> f64 {
    match kind {
        HeuristicKind::Manhattan => {
            let [px, py, pz] = point;
            (cell.x as f64 - px).abs() + (cell.y as f64 - py).abs() + (cell.z as f64 - pz).abs()
        }
        HeuristicKind::Euclidean => cell.euclidean_to(point),
    }
}

/// Frontier entry; lowest priority pops first, then earliest pushed
#[derive(Debug)]
struct OpenEntry {
    priority: f64,
    seq: u64,
    cost: u32,
    cell: Cell,
    parent: Option<Cell>,
    first_step: Option<Direction>,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A* engine parameterized by a `SearchPolicy`
#[derive(Debug, Clone)]
pub struct PathSearch {
    policy: SearchPolicy,
}

impl PathSearch {
    pub fn new(policy: SearchPolicy) -> Self {
        PathSearch { policy }
    }

    /// Searches from `origin` to `target`, blending in the center bias if configured
    pub fn search(&self, grid: &Grid, origin: Cell, target: Cell, deadline: &Deadline) -> SearchOutcome {
        self.run(grid, origin, target, self.policy.center_weight, deadline)
    }

    /// Searches toward the map center and keeps only the first few moves
    pub fn search_center(&self, grid: &Grid, origin: Cell, deadline: &Deadline) -> SearchOutcome {
        match self.run(grid, origin, grid.center_cell(), 0.0, deadline) {
            SearchOutcome::Found(route) => SearchOutcome::Found(Route {
                first_step: route.first_step,
                path: route.path.truncated(self.policy.centering_path_cap.max(1)),
            }),
            other => other,
        }
    }

    fn run(
        &self,
        grid: &Grid,
        origin: Cell,
        target: Cell,
        center_weight: f64,
        deadline: &Deadline,
    ) -> SearchOutcome {
        if origin == target {
            return SearchOutcome::AtTarget;
        }
        if !grid.is_safe(&target) {
            return SearchOutcome::Unreachable;
        }

        let target_point = target.as_point();
        let center = grid.center();
        let heuristic = |cell: &Cell| {
            let to_target = distance(self.policy.heuristic, cell, target_point);
            if center_weight > 0.0 {
                to_target + center_weight * distance(self.policy.heuristic, cell, center)
            } else {
                to_target
            }
        };

        let mut open = BinaryHeap::new();
        let mut visited: HashSet<Cell> = HashSet::new();
        let mut parents: HashMap<Cell, Cell> = HashMap::new();
        let mut seq: u64 = 0;
        let mut iterations: usize = 0;

        open.push(OpenEntry {
            priority: 0.0,
            seq,
            cost: 0,
            cell: origin,
            parent: None,
            first_step: None,
        });

        while let Some(entry) = open.pop() {
            iterations += 1;
            if iterations > self.policy.max_iterations {
                debug!("Search {} -> {} hit iteration cap", origin, target);
                return SearchOutcome::IterationCapReached;
            }
            if deadline.is_expired() {
                debug!(
                    "Search {} -> {} interrupted after {} expansions",
                    origin,
                    target,
                    visited.len()
                );
                return SearchOutcome::Interrupted;
            }

            if !visited.insert(entry.cell) {
                continue;
            }
            if let Some(parent) = entry.parent {
                parents.insert(entry.cell, parent);
            }

            if entry.cell == target {
                let path = Self::rebuild_path(&parents, origin, target);
                // The origin is never the target here, so a first step always exists
                return match entry.first_step {
                    Some(first_step) => {
                        debug!(
                            "Search {} -> {} converged in {} expansions ({} moves)",
                            origin,
                            target,
                            visited.len(),
                            path.len()
                        );
                        SearchOutcome::Found(Route { first_step, path })
                    }
                    None => SearchOutcome::AtTarget,
                };
            }

            for dir in Direction::all() {
                let next = dir.apply(&entry.cell);
                if visited.contains(&next) || !grid.is_safe(&next) {
                    continue;
                }
                seq += 1;
                open.push(OpenEntry {
                    priority: (entry.cost + 1) as f64 + heuristic(&next),
                    seq,
                    cost: entry.cost + 1,
                    cell: next,
                    parent: Some(entry.cell),
                    first_step: entry.first_step.or(Some(dir)),
                });
            }
        }

        SearchOutcome::Unreachable
    }

    fn rebuild_path(parents: &HashMap<Cell, Cell>, origin: Cell, target: Cell) -> Path {
        let mut cells = vec![target];
        let mut current = target;
        while current != origin {
            match parents.get(&current) {
                Some(&parent) => {
                    cells.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        cells.reverse();
        Path::new(cells)
    }
}
