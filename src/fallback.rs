// Fallback director
//
// Degrades a plan one step at a time and never climbs back up within a tick:
//   targeted search -> center search -> single center-seeking step -> first safe step -> +x
// The game has no "stay" move, so the last rung always returns a direction.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::scheduler::Deadline;
use crate::search::{Path, PathSearch, Route, SearchOutcome};
use crate::types::{Cell, Direction};

/// Which rung of the fallback ladder produced a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanOutcome {
    /// Fresh search reached a valued target
    Targeted,
    /// Previous tick's path toward the same target was kept
    Reused,
    /// Search toward the map center
    Centering,
    /// Greedy single move that gets closer to the center
    CenterStep,
    /// First in-bounds, non-hazardous neighbour
    SafeStep,
    /// Fully boxed in; moving +x regardless
    DefaultForward,
}

impl PlanOutcome {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, PlanOutcome::Targeted | PlanOutcome::Reused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanOutcome::Targeted => "targeted",
            PlanOutcome::Reused => "reused",
            PlanOutcome::Centering => "centering",
            PlanOutcome::CenterStep => "center-step",
            PlanOutcome::SafeStep => "safe-step",
            PlanOutcome::DefaultForward => "default-forward",
        }
    }
}

/// Final answer for one agent
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub direction: Direction,
    pub path: Path,
    pub outcome: PlanOutcome,
    /// Target the path leads to; only set for targeted and reused plans
    pub target: Option<Cell>,
    /// Fresh searches started while reaching this decision
    pub searches: usize,
    /// How the targeted search ended, when one ran and did not converge
    pub target_search: Option<&'static str>,
}

impl Decision {
    fn single_step(origin: Cell, direction: Direction, outcome: PlanOutcome, searches: usize) -> Self {
        Decision {
            direction,
            path: Path::new(vec![origin, direction.apply(&origin)]),
            outcome,
            target: None,
            searches,
            target_search: None,
        }
    }
}

/// Runs the fallback ladder for one agent
#[derive(Debug, Clone, Copy)]
pub struct FallbackDirector<'a> {
    engine: &'a PathSearch,
}

impl<'a> FallbackDirector<'a> {
    pub fn new(engine: &'a PathSearch) -> Self {
        FallbackDirector { engine }
    }

    /// Full ladder starting from a targeted search (or from centering when `target` is None)
    pub fn decide(&self, grid: &Grid, origin: Cell, target: Option<Cell>, deadline: &Deadline) -> Decision {
        let Some(target) = target else {
            return self.center(grid, origin, deadline, 0);
        };

        match self.engine.search(grid, origin, target, deadline) {
            SearchOutcome::Found(Route { first_step, path }) => Decision {
                direction: first_step,
                path,
                outcome: PlanOutcome::Targeted,
                target: Some(target),
                searches: 1,
                target_search: None,
            },
            other => {
                debug!("Targeted search {} -> {}: {}", origin, target, other.label());
                let mut decision = self.center(grid, origin, deadline, 1);
                decision.target_search = Some(other.label());
                decision
            }
        }
    }

    /// Center-seeking rungs, then the safe-step rungs
    pub fn center(&self, grid: &Grid, origin: Cell, deadline: &Deadline, mut searches: usize) -> Decision {
        let center = grid.center();
        let here = origin.euclidean_to(center);

        if origin != grid.center_cell() {
            searches += 1;
            if let SearchOutcome::Found(route) = self.engine.search_center(grid, origin, deadline) {
                // Only accept the search if its first move really gets closer
                if route.first_step.apply(&origin).euclidean_to(center) < here {
                    return Decision {
                        direction: route.first_step,
                        path: route.path,
                        outcome: PlanOutcome::Centering,
                        target: None,
                        searches,
                        target_search: None,
                    };
                }
            }
        }

        if let Some(direction) = Self::center_step(grid, origin) {
            return Decision::single_step(origin, direction, PlanOutcome::CenterStep, searches);
        }

        match Self::safe_step(grid, origin) {
            Some(direction) => Decision::single_step(origin, direction, PlanOutcome::SafeStep, searches),
            None => Decision::single_step(origin, Direction::PosX, PlanOutcome::DefaultForward, searches),
        }
    }

    /// Safe neighbour closest to the map center, if it is strictly closer than `origin`
    pub fn center_step(grid: &Grid, origin: Cell) -> Option<Direction> {
        let center = grid.center();
        let here = origin.euclidean_to(center);

        Direction::all()
            .into_iter()
            .filter(|dir| grid.is_safe(&dir.apply(&origin)))
            .map(|dir| (dir, dir.apply(&origin).euclidean_to(center)))
            .filter(|&(_, dist)| dist < here)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(dir, _)| dir)
    }

    /// First direction, in fixed order, that stays in bounds and off hazards
    pub fn safe_step(grid: &Grid, origin: Cell) -> Option<Direction> {
        Direction::all()
            .into_iter()
            .find(|dir| grid.is_safe(&dir.apply(&origin)))
    }
}
