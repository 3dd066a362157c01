// Snake3D API Types
// Wire format of the move endpoint plus the lattice primitives shared by the planner

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 3D lattice coordinate, serialized as `[x, y, z]`
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Cell { x, y, z }
    }

    /// Sum of per-axis distances; the exact step count on an open 6-connected lattice
    pub fn manhattan(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    pub fn euclidean(&self, other: &Cell) -> f64 {
        self.euclidean_to(other.as_point())
    }

    /// Euclidean distance to an arbitrary (possibly fractional) point
    pub fn euclidean_to(&self, point: [f64; 3]) -> f64 {
        let [px, py, pz] = point;
        let dx = self.x as f64 - px;
        let dy = self.y as f64 - py;
        let dz = self.z as f64 - pz;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn as_point(&self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.z as f64]
    }

    /// The six axis-aligned neighbours in `Direction::all()` order
    pub fn neighbors(&self) -> [Cell; 6] {
        Direction::all().map(|dir| dir.apply(self))
    }

    /// Direction of a unit step from `self` to `other`, if they are axis neighbours
    pub fn direction_to(&self, other: &Cell) -> Option<Direction> {
        Direction::all()
            .into_iter()
            .find(|dir| dir.apply(self) == *other)
    }
}

impl From<[i32; 3]> for Cell {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Cell { x, y, z }
    }
}

impl From<Cell> for [i32; 3] {
    fn from(cell: Cell) -> Self {
        [cell.x, cell.y, cell.z]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The six unit moves a snake can make
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "[i32; 3]", into = "[i32; 3]")]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    /// Returns all directions in the fixed enumeration order used by the safe-step policy
    pub fn all() -> [Direction; 6] {
        [
            Direction::PosX,
            Direction::NegX,
            Direction::PosY,
            Direction::NegY,
            Direction::PosZ,
            Direction::NegZ,
        ]
    }

    /// Unit vector `[dx, dy, dz]` as sent to the server
    pub fn delta(&self) -> [i32; 3] {
        match self {
            Direction::PosX => [1, 0, 0],
            Direction::NegX => [-1, 0, 0],
            Direction::PosY => [0, 1, 0],
            Direction::NegY => [0, -1, 0],
            Direction::PosZ => [0, 0, 1],
            Direction::NegZ => [0, 0, -1],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::PosX => "+x",
            Direction::NegX => "-x",
            Direction::PosY => "+y",
            Direction::NegY => "-y",
            Direction::PosZ => "+z",
            Direction::NegZ => "-z",
        }
    }

    /// Calculates the next cell when moving in this direction
    pub fn apply(&self, cell: &Cell) -> Cell {
        let [dx, dy, dz] = self.delta();
        Cell::new(cell.x + dx, cell.y + dy, cell.z + dz)
    }
}

impl TryFrom<[i32; 3]> for Direction {
    type Error = String;

    fn try_from(delta: [i32; 3]) -> Result<Self, Self::Error> {
        Direction::all()
            .into_iter()
            .find(|dir| dir.delta() == delta)
            .ok_or_else(|| format!("not a unit direction: {:?}", delta))
    }
}

impl From<Direction> for [i32; 3] {
    fn from(dir: Direction) -> Self {
        dir.delta()
    }
}

/// Life status reported for snakes and enemies
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnakeStatus {
    Alive,
    Dead,
    #[serde(other)]
    Unknown,
}

/// One of our own snakes
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Snake {
    pub id: String,
    pub geometry: Vec<Cell>,
    #[serde(default)]
    pub direction: Option<[i32; 3]>,
    pub status: SnakeStatus,
    #[serde(default)]
    pub revive_remain_ms: u64,
}

impl Snake {
    pub fn head(&self) -> Option<Cell> {
        self.geometry.first().copied()
    }

    /// Only alive snakes with a body on the map get a move
    pub fn is_plannable(&self) -> bool {
        self.status == SnakeStatus::Alive && !self.geometry.is_empty()
    }
}

/// An opponent's snake
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub geometry: Vec<Cell>,
    pub status: SnakeStatus,
    #[serde(default)]
    pub kills: u32,
}

/// An ordinary food item
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Food {
    pub c: Cell,
    pub points: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SpecialFood {
    #[serde(default)]
    pub golden: Vec<Cell>,
    #[serde(default)]
    pub suspicious: Vec<Cell>,
}

/// Complete game state received from the move endpoint
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub map_size: [i32; 3],
    pub snakes: Vec<Snake>,
    pub enemies: Vec<Enemy>,
    pub food: Vec<Food>,
    pub fences: Vec<Cell>,
    pub special_food: SpecialFood,
    pub tick_remain_ms: u64,
    #[serde(default)]
    pub turn: u64,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub revive_timeout_sec: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl GameState {
    /// Parses and validates a raw server response
    ///
    /// A response that is missing fields or carries an impossible map size is
    /// rejected; the caller must not plan on guessed data.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let state: GameState = serde_json::from_value(value)
            .map_err(|e| format!("Malformed game state: {}", e))?;
        state.validate()?;
        Ok(state)
    }

    fn validate(&self) -> Result<(), String> {
        if self.map_size.iter().any(|&extent| extent <= 0) {
            return Err(format!("Invalid map size: {:?}", self.map_size));
        }
        if let Some(snake) = self.snakes.iter().find(|s| s.id.is_empty()) {
            return Err(format!(
                "Snake with empty id (head {:?})",
                snake.head()
            ));
        }
        Ok(())
    }
}

/// A single snake's move for the next tick
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SnakeMove {
    pub id: String,
    pub direction: Direction,
}

/// Body of the move request
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct MoveRequest {
    pub snakes: Vec<SnakeMove>,
}

impl MoveRequest {
    /// Request with no moves; used to fetch the first state and after a malformed tick
    pub fn empty() -> Self {
        MoveRequest { snakes: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> Value {
        json!({
            "mapSize": [180, 180, 60],
            "name": "team",
            "points": 12,
            "fences": [[1, 2, 3]],
            "snakes": [{
                "id": "a",
                "direction": [1, 0, 0],
                "oldDirection": [1, 0, 0],
                "geometry": [[10, 10, 10], [9, 10, 10]],
                "deathCount": 0,
                "status": "alive",
                "reviveRemainMs": 0
            }],
            "enemies": [{
                "geometry": [[20, 20, 20]],
                "status": "alive",
                "kills": 1
            }],
            "food": [{ "c": [5, 5, 5], "points": 7 }],
            "specialFood": { "golden": [[6, 6, 6]], "suspicious": [] },
            "turn": 42,
            "reviveTimeoutSec": 5,
            "tickRemainMs": 310,
            "errors": []
        })
    }

    #[test]
    fn test_game_state_parses_server_shape() {
        let state = GameState::from_value(sample_state()).expect("valid state");
        assert_eq!(state.map_size, [180, 180, 60]);
        assert_eq!(state.snakes[0].head(), Some(Cell::new(10, 10, 10)));
        assert_eq!(state.enemies[0].kills, 1);
        assert_eq!(state.food[0].c, Cell::new(5, 5, 5));
        assert_eq!(state.special_food.golden, vec![Cell::new(6, 6, 6)]);
        assert_eq!(state.tick_remain_ms, 310);
        assert_eq!(state.turn, 42);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut value = sample_state();
        value.as_object_mut().unwrap().remove("mapSize");
        let err = GameState::from_value(value).unwrap_err();
        assert!(err.contains("mapSize"), "unexpected error: {}", err);
    }

    #[test]
    fn test_bad_map_size_is_rejected() {
        let mut value = sample_state();
        value["mapSize"] = json!([0, 10, 10]);
        assert!(GameState::from_value(value).is_err());
    }

    #[test]
    fn test_move_request_shape() {
        let request = MoveRequest {
            snakes: vec![SnakeMove {
                id: "a".to_string(),
                direction: Direction::NegZ,
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "snakes": [{ "id": "a", "direction": [0, 0, -1] }] }));
    }

    #[test]
    fn test_direction_rejects_non_unit_vector() {
        let parsed: Result<Direction, _> = serde_json::from_value(json!([1, 1, 0]));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_direction_to_neighbor() {
        let origin = Cell::new(2, 2, 2);
        for dir in Direction::all() {
            assert_eq!(origin.direction_to(&dir.apply(&origin)), Some(dir));
        }
        assert_eq!(origin.direction_to(&Cell::new(3, 3, 2)), None);
    }
}
