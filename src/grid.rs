// Per-tick grid model
//
// Folds every snapshot source (fences, bodies, enemy head halos, food, special food)
// into one classification per cell. Non-positive cells become the hazard set;
// positive cells are kept aside as candidate targets.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::config::ValuationConfig;
use crate::types::{Cell, GameState, SnakeStatus};

/// A cell with a signed value: > 0 beneficial, <= 0 blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightedCell {
    pub cell: Cell,
    pub price: i64,
}

impl WeightedCell {
    pub fn new(cell: Cell, price: i64) -> Self {
        WeightedCell { cell, price }
    }
}

/// Combines two classifications of the same cell. Any hazard wins over any value.
fn merge_price(current: i64, incoming: i64) -> i64 {
    if current <= 0 || incoming <= 0 {
        current.min(incoming)
    } else {
        current.max(incoming)
    }
}

/// Immutable snapshot of the lattice for one tick
#[derive(Debug, Clone)]
pub struct Grid {
    map_size: [i32; 3],
    hazards: HashSet<Cell>,
    valued: Vec<WeightedCell>,
}

impl Grid {
    /// Builds the grid from a list of weighted cells, resolving overlaps
    pub fn from_weighted<I>(map_size: [i32; 3], cells: I) -> Self
    where
        I: IntoIterator<Item = WeightedCell>,
    {
        let mut merged: HashMap<Cell, i64> = HashMap::new();
        for wc in cells {
            merged
                .entry(wc.cell)
                .and_modify(|price| *price = merge_price(*price, wc.price))
                .or_insert(wc.price);
        }

        let mut hazards = HashSet::with_capacity(merged.len());
        let mut valued = Vec::new();
        for (cell, price) in merged {
            if price > 0 {
                valued.push(WeightedCell::new(cell, price));
            } else {
                hazards.insert(cell);
            }
        }
        valued.sort_by_key(|wc| wc.cell);

        Grid {
            map_size,
            hazards,
            valued,
        }
    }

    /// Builds the grid from a server game state
    pub fn from_state(state: &GameState, valuation: &ValuationConfig) -> Result<Self, String> {
        if state.map_size.iter().any(|&extent| extent <= 0) {
            return Err(format!("Invalid map size: {:?}", state.map_size));
        }

        let mut cells = Vec::new();

        cells.extend(
            state
                .fences
                .iter()
                .map(|&c| WeightedCell::new(c, valuation.fence_value)),
        );

        for snake in state.snakes.iter().filter(|s| s.status == SnakeStatus::Alive) {
            let skip = if valuation.include_own_heads { 0 } else { 1 };
            cells.extend(
                snake
                    .geometry
                    .iter()
                    .skip(skip)
                    .map(|&c| WeightedCell::new(c, valuation.own_body_value)),
            );
        }

        for enemy in state.enemies.iter().filter(|e| e.status == SnakeStatus::Alive) {
            cells.extend(
                enemy
                    .geometry
                    .iter()
                    .map(|&c| WeightedCell::new(c, valuation.enemy_body_value)),
            );
            // An enemy head may step into any neighbour next tick
            if let Some(head) = enemy.geometry.first() {
                cells.extend(
                    head.neighbors()
                        .iter()
                        .map(|&c| WeightedCell::new(c, valuation.enemy_halo_value)),
                );
            }
        }

        cells.extend(state.food.iter().map(|f| WeightedCell::new(f.c, f.points)));

        let max_food = state
            .food
            .iter()
            .map(|f| f.points)
            .filter(|&p| p > 0)
            .max()
            .unwrap_or(1);
        let golden_value = max_food.saturating_mul(valuation.golden_multiplier);
        cells.extend(
            state
                .special_food
                .golden
                .iter()
                .map(|&c| WeightedCell::new(c, golden_value)),
        );
        cells.extend(
            state
                .special_food
                .suspicious
                .iter()
                .map(|&c| WeightedCell::new(c, valuation.suspicious_value)),
        );

        Ok(Self::from_weighted(state.map_size, cells))
    }

    /// Bounds are inclusive: `0 <= c <= map_size` on every axis
    pub fn in_bounds(&self, cell: &Cell) -> bool {
        let [sx, sy, sz] = self.map_size;
        (0..=sx).contains(&cell.x) && (0..=sy).contains(&cell.y) && (0..=sz).contains(&cell.z)
    }

    pub fn is_hazard(&self, cell: &Cell) -> bool {
        self.hazards.contains(cell)
    }

    /// A cell an agent may step into this tick
    pub fn is_safe(&self, cell: &Cell) -> bool {
        self.in_bounds(cell) && !self.is_hazard(cell)
    }

    /// Positive cells, ordered by coordinate
    pub fn valued(&self) -> &[WeightedCell] {
        &self.valued
    }

    pub fn hazard_count(&self) -> usize {
        self.hazards.len()
    }

    /// Geometric center of the map
    pub fn center(&self) -> [f64; 3] {
        self.map_size.map(|extent| extent as f64 / 2.0)
    }

    /// Lattice cell at (or just below) the geometric center
    pub fn center_cell(&self) -> Cell {
        let [sx, sy, sz] = self.map_size;
        Cell::new(sx / 2, sy / 2, sz / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{Enemy, Food, Snake, SpecialFood};

    fn snake(id: &str, geometry: Vec<Cell>) -> Snake {
        Snake {
            id: id.to_string(),
            geometry,
            direction: None,
            status: SnakeStatus::Alive,
            revive_remain_ms: 0,
        }
    }

    fn state() -> GameState {
        GameState {
            map_size: [20, 20, 20],
            snakes: vec![snake("a", vec![Cell::new(1, 1, 1), Cell::new(0, 1, 1)])],
            enemies: vec![Enemy {
                geometry: vec![Cell::new(10, 10, 10), Cell::new(10, 10, 11)],
                status: SnakeStatus::Alive,
                kills: 0,
            }],
            food: vec![
                Food { c: Cell::new(5, 5, 5), points: 4 },
                Food { c: Cell::new(9, 10, 10), points: 30 },
            ],
            fences: vec![Cell::new(3, 3, 3)],
            special_food: SpecialFood {
                golden: vec![Cell::new(7, 7, 7)],
                suspicious: vec![Cell::new(8, 8, 8)],
            },
            tick_remain_ms: 300,
            turn: 1,
            points: 0,
            revive_timeout_sec: 0,
            errors: vec![],
        }
    }

    #[test]
    fn test_hazards_cover_every_blocking_source() {
        let config = Config::default_hardcoded();
        let grid = Grid::from_state(&state(), &config.valuation).unwrap();

        assert!(grid.is_hazard(&Cell::new(3, 3, 3)), "fence");
        assert!(grid.is_hazard(&Cell::new(0, 1, 1)), "own body");
        assert!(grid.is_hazard(&Cell::new(1, 1, 1)), "own head");
        assert!(grid.is_hazard(&Cell::new(10, 10, 11)), "enemy body");
        assert!(grid.is_hazard(&Cell::new(11, 10, 10)), "enemy halo");
        assert!(grid.is_hazard(&Cell::new(8, 8, 8)), "suspicious food");
        assert!(!grid.is_hazard(&Cell::new(5, 5, 5)));
    }

    #[test]
    fn test_hazard_wins_over_food_on_same_cell() {
        let config = Config::default_hardcoded();
        let grid = Grid::from_state(&state(), &config.valuation).unwrap();

        // Food at (9,10,10) sits in the enemy head halo
        let food_cell = Cell::new(9, 10, 10);
        assert!(grid.is_hazard(&food_cell));
        assert!(grid.valued().iter().all(|wc| wc.cell != food_cell));
    }

    #[test]
    fn test_golden_food_uses_multiplier_of_best_food() {
        let config = Config::default_hardcoded();
        let grid = Grid::from_state(&state(), &config.valuation).unwrap();

        let golden = grid
            .valued()
            .iter()
            .find(|wc| wc.cell == Cell::new(7, 7, 7))
            .expect("golden food is valued");
        // Best ordinary food is 30 points, even though it is blocked
        assert_eq!(golden.price, 30 * config.valuation.golden_multiplier);
    }

    #[test]
    fn test_own_head_can_be_excluded() {
        let mut config = Config::default_hardcoded();
        config.valuation.include_own_heads = false;
        let grid = Grid::from_state(&state(), &config.valuation).unwrap();

        assert!(!grid.is_hazard(&Cell::new(1, 1, 1)));
        assert!(grid.is_hazard(&Cell::new(0, 1, 1)));
    }

    #[test]
    fn test_dead_enemies_are_ignored() {
        let config = Config::default_hardcoded();
        let mut s = state();
        s.enemies[0].status = SnakeStatus::Dead;
        let grid = Grid::from_state(&s, &config.valuation).unwrap();

        assert!(!grid.is_hazard(&Cell::new(10, 10, 11)));
        assert!(!grid.is_hazard(&Cell::new(11, 10, 10)));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let grid = Grid::from_weighted([10, 10, 10], vec![]);
        assert!(grid.in_bounds(&Cell::new(0, 0, 0)));
        assert!(grid.in_bounds(&Cell::new(10, 10, 10)));
        assert!(!grid.in_bounds(&Cell::new(11, 0, 0)));
        assert!(!grid.in_bounds(&Cell::new(0, -1, 0)));
    }

    #[test]
    fn test_positive_overlap_keeps_maximum() {
        let c = Cell::new(1, 2, 3);
        let grid = Grid::from_weighted(
            [10, 10, 10],
            vec![WeightedCell::new(c, 5), WeightedCell::new(c, 50)],
        );
        assert_eq!(grid.valued(), &[WeightedCell::new(c, 50)]);
    }

    #[test]
    fn test_center() {
        let grid = Grid::from_weighted([10, 11, 4], vec![]);
        assert_eq!(grid.center(), [5.0, 5.5, 2.0]);
        assert_eq!(grid.center_cell(), Cell::new(5, 5, 2));
    }
}
