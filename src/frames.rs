// Render frames
//
// Each tick publishes one self-contained frame: the snapshot plus every agent's
// chosen path. A viewer polls the latest frame; nothing flows back to the planner.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::fallback::PlanOutcome;
use crate::planner::TickPlan;
use crate::types::{Cell, Direction, Food, GameState};

/// One controlled snake as drawn by a viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentFrame {
    pub id: String,
    pub body: Vec<Cell>,
    pub direction: Option<Direction>,
    pub path: Vec<Cell>,
    pub outcome: Option<PlanOutcome>,
    pub target: Option<Cell>,
}

/// Everything a viewer needs to draw one tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderFrame {
    pub turn: u64,
    pub points: i64,
    pub map_size: [i32; 3],
    pub fences: Vec<Cell>,
    pub food: Vec<Food>,
    pub golden: Vec<Cell>,
    pub suspicious: Vec<Cell>,
    pub enemies: Vec<Vec<Cell>>,
    pub snakes: Vec<AgentFrame>,
}

impl RenderFrame {
    /// Builds a frame; snakes without a plan (dead, or a rejected tick) are drawn without a path
    pub fn build(state: &GameState, plan: Option<&TickPlan>) -> Self {
        let snakes = state
            .snakes
            .iter()
            .map(|snake| {
                let decision = plan
                    .and_then(|p| p.plans.iter().find(|agent| agent.id == snake.id))
                    .map(|agent| &agent.decision);
                AgentFrame {
                    id: snake.id.clone(),
                    body: snake.geometry.clone(),
                    direction: decision.map(|d| d.direction),
                    path: decision.map(|d| d.path.cells().to_vec()).unwrap_or_default(),
                    outcome: decision.map(|d| d.outcome),
                    target: decision.and_then(|d| d.target),
                }
            })
            .collect();

        RenderFrame {
            turn: state.turn,
            points: state.points,
            map_size: state.map_size,
            fences: state.fences.clone(),
            food: state.food.clone(),
            golden: state.special_food.golden.clone(),
            suspicious: state.special_food.suspicious.clone(),
            enemies: state.enemies.iter().map(|e| e.geometry.clone()).collect(),
            snakes,
        }
    }
}

/// Latest published frame, shared between the tick loop and the HTTP handlers
#[derive(Debug, Default)]
pub struct FrameStore {
    latest: RwLock<Option<RenderFrame>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: RenderFrame) {
        *self.latest.write() = Some(frame);
    }

    pub fn latest(&self) -> Option<RenderFrame> {
        self.latest.read().clone()
    }

    pub fn latest_turn(&self) -> Option<u64> {
        self.latest.read().as_ref().map(|frame| frame.turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::Decision;
    use crate::planner::{AgentPlan, ExecutionStrategy};
    use crate::search::Path;
    use crate::types::{Snake, SnakeStatus, SpecialFood};
    use std::time::Duration;

    fn state() -> GameState {
        GameState {
            map_size: [10, 10, 10],
            snakes: vec![
                Snake {
                    id: "a".to_string(),
                    geometry: vec![Cell::new(1, 1, 1)],
                    direction: None,
                    status: SnakeStatus::Alive,
                    revive_remain_ms: 0,
                },
                Snake {
                    id: "b".to_string(),
                    geometry: vec![],
                    direction: None,
                    status: SnakeStatus::Dead,
                    revive_remain_ms: 1500,
                },
            ],
            enemies: vec![],
            food: vec![],
            fences: vec![Cell::new(0, 0, 0)],
            special_food: SpecialFood::default(),
            tick_remain_ms: 100,
            turn: 7,
            points: 3,
            revive_timeout_sec: 0,
            errors: vec![],
        }
    }

    #[test]
    fn test_frame_carries_paths_of_planned_snakes() {
        let path = Path::new(vec![Cell::new(1, 1, 1), Cell::new(2, 1, 1)]);
        let plan = TickPlan {
            turn: 7,
            plans: vec![AgentPlan {
                id: "a".to_string(),
                decision: Decision {
                    direction: Direction::PosX,
                    path: path.clone(),
                    outcome: PlanOutcome::SafeStep,
                    target: None,
                    searches: 1,
                    target_search: None,
                },
            }],
            strategy: ExecutionStrategy::Sequential,
            elapsed: Duration::from_millis(1),
        };

        let frame = RenderFrame::build(&state(), Some(&plan));
        assert_eq!(frame.turn, 7);
        assert_eq!(frame.snakes.len(), 2);
        assert_eq!(frame.snakes[0].path, path.cells().to_vec());
        assert_eq!(frame.snakes[0].outcome, Some(PlanOutcome::SafeStep));
        assert!(frame.snakes[1].path.is_empty());
        assert_eq!(frame.snakes[1].direction, None);
    }

    #[test]
    fn test_store_keeps_latest_frame() {
        let store = FrameStore::new();
        assert!(store.latest().is_none());

        store.publish(RenderFrame::build(&state(), None));
        let mut later = state();
        later.turn = 8;
        store.publish(RenderFrame::build(&later, None));

        assert_eq!(store.latest_turn(), Some(8));
    }
}
