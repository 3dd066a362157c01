// Target selection
//
// Greedy value-first choice: the most valuable cell within the current radius,
// nearest first among equals. This is not a value-per-step optimum; a far rich
// cell beats a near modest one as long as it is inside the radius.

use crate::config::TargetingConfig;
use crate::grid::{Grid, WeightedCell};
use crate::types::Cell;

/// A goal picked for one agent this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub cell: Cell,
    pub price: i64,
    pub distance: f64,
    /// Radius at which the target was found
    pub radius: f64,
}

/// Expanding-radius target selector
#[derive(Debug, Clone)]
pub struct TargetSelector {
    initial_radius: f64,
    max_radius: f64,
}

impl TargetSelector {
    pub fn new(initial_radius: f64, max_radius: f64) -> Self {
        TargetSelector {
            initial_radius,
            max_radius,
        }
    }

    pub fn from_config(config: &TargetingConfig) -> Self {
        Self::new(config.initial_radius, config.max_radius)
    }

    /// Picks the best positive cell around `position`, or `None` if nothing lies within `max_radius`
    ///
    /// The radius doubles after each empty pass and is clamped to `max_radius`, so the
    /// last pass always runs at exactly `max_radius`.
    pub fn select(&self, grid: &Grid, position: &Cell) -> Option<Target> {
        let mut radius = self.initial_radius.min(self.max_radius);

        loop {
            if let Some(target) = Self::best_within(grid, position, radius) {
                return Some(target);
            }
            if radius >= self.max_radius || radius <= 0.0 {
                return None;
            }
            radius = (radius * 2.0).min(self.max_radius);
        }
    }

    fn best_within(grid: &Grid, position: &Cell, radius: f64) -> Option<Target> {
        grid.valued()
            .iter()
            .filter(|wc| wc.cell != *position && grid.in_bounds(&wc.cell))
            .map(|wc: &WeightedCell| (wc, position.euclidean(&wc.cell)))
            .filter(|&(_, distance)| distance <= radius)
            .min_by(|(a, da), (b, db)| {
                b.price
                    .cmp(&a.price)
                    .then(da.total_cmp(db))
                    .then(a.cell.cmp(&b.cell))
            })
            .map(|(wc, distance)| Target {
                cell: wc.cell,
                price: wc.price,
                distance,
                radius,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cells: Vec<(Cell, i64)>) -> Grid {
        Grid::from_weighted(
            [100, 100, 100],
            cells.into_iter().map(|(c, p)| WeightedCell::new(c, p)),
        )
    }

    #[test]
    fn test_higher_value_wins_over_distance() {
        let g = grid(vec![
            (Cell::new(1, 0, 0), 5),
            (Cell::new(10, 0, 0), 50),
        ]);
        let target = TargetSelector::new(15.0, 64.0)
            .select(&g, &Cell::new(0, 0, 0))
            .unwrap();
        assert_eq!(target.cell, Cell::new(10, 0, 0));
        assert_eq!(target.price, 50);
    }

    #[test]
    fn test_nearer_wins_among_equal_values() {
        let g = grid(vec![
            (Cell::new(8, 0, 0), 5),
            (Cell::new(0, 3, 0), 5),
        ]);
        let target = TargetSelector::new(15.0, 64.0)
            .select(&g, &Cell::new(0, 0, 0))
            .unwrap();
        assert_eq!(target.cell, Cell::new(0, 3, 0));
    }

    #[test]
    fn test_radius_doubles_until_found() {
        let g = grid(vec![(Cell::new(40, 0, 0), 5)]);
        let target = TargetSelector::new(15.0, 64.0)
            .select(&g, &Cell::new(0, 0, 0))
            .unwrap();
        assert_eq!(target.radius, 60.0);
    }

    #[test]
    fn test_last_pass_runs_at_max_radius() {
        let g = grid(vec![(Cell::new(62, 0, 0), 5)]);
        let target = TargetSelector::new(15.0, 64.0)
            .select(&g, &Cell::new(0, 0, 0))
            .unwrap();
        assert_eq!(target.radius, 64.0);
    }

    #[test]
    fn test_target_beyond_max_radius_is_never_selected() {
        let g = grid(vec![(Cell::new(65, 0, 0), 1000)]);
        assert_eq!(
            TargetSelector::new(15.0, 64.0).select(&g, &Cell::new(0, 0, 0)),
            None
        );
    }

    #[test]
    fn test_own_position_is_not_a_target() {
        let g = grid(vec![(Cell::new(0, 0, 0), 1000)]);
        assert_eq!(
            TargetSelector::new(15.0, 64.0).select(&g, &Cell::new(0, 0, 0)),
            None
        );
    }
}
