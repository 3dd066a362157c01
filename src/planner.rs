// Per-agent planner
//
// Builds the grid once per tick and plans every controlled snake against it.
// Snakes are planned independently; with enough agents and cores the work is
// spread over the rayon pool, each worker checking the shared deadline itself.

use log::{error, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::fallback::{Decision, FallbackDirector, PlanOutcome};
use crate::grid::Grid;
use crate::scheduler::Deadline;
use crate::search::{Path, PathSearch, SearchPolicy};
use crate::target::TargetSelector;
use crate::types::{Cell, GameState, MoveRequest, Snake, SnakeMove};

/// Execution strategy based on agent count and hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Agents planned one after another on the calling thread
    Sequential,
    /// One rayon task per agent
    Parallel,
}

/// What an agent was heading for last tick
#[derive(Debug, Clone)]
struct PlanMemory {
    target: Cell,
    path: Path,
}

/// Decision for one snake
#[derive(Debug, Clone)]
pub struct AgentPlan {
    pub id: String,
    pub decision: Decision,
}

/// Everything planned in one tick
#[derive(Debug, Clone)]
pub struct TickPlan {
    pub turn: u64,
    pub plans: Vec<AgentPlan>,
    pub strategy: ExecutionStrategy,
    pub elapsed: Duration,
}

impl TickPlan {
    /// The request body carrying every agent's move
    pub fn to_request(&self) -> MoveRequest {
        MoveRequest {
            snakes: self
                .plans
                .iter()
                .map(|plan| SnakeMove {
                    id: plan.id.clone(),
                    direction: plan.decision.direction,
                })
                .collect(),
        }
    }

    pub fn degraded_count(&self) -> usize {
        self.plans
            .iter()
            .filter(|plan| plan.decision.outcome.is_degraded())
            .count()
    }
}

/// Plans all controlled snakes for a tick
/// Holds static configuration plus the per-agent path memory carried between ticks
pub struct Planner {
    config: Config,
    selector: TargetSelector,
    engine: PathSearch,
    memory: Mutex<HashMap<String, PlanMemory>>,
    searches: AtomicUsize,
}

impl Planner {
    /// Creates a new Planner instance with the given configuration
    pub fn new(config: Config) -> Self {
        let selector = TargetSelector::from_config(&config.targeting);
        let engine = PathSearch::new(SearchPolicy::from_config(&config.search));
        Planner {
            config,
            selector,
            engine,
            memory: Mutex::new(HashMap::new()),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fresh path searches started since this planner was created
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::Acquire)
    }

    /// Plans every alive snake with a body on the map
    ///
    /// # Arguments
    /// * `state` - Game state received for this tick
    /// * `deadline` - Instant after which searches give up and fall back
    ///
    /// # Returns
    /// * `Result<TickPlan, String>` - Moves for all agents, or why the snapshot was unusable
    pub fn plan_tick(&self, state: &GameState, deadline: Deadline) -> Result<TickPlan, String> {
        let start_time = Instant::now();
        let grid = Grid::from_state(state, &self.config.valuation)?;

        let agents: Vec<(&Snake, Cell)> = state
            .snakes
            .iter()
            .filter(|snake| snake.is_plannable())
            .filter_map(|snake| snake.head().map(|head| (snake, head)))
            .collect();

        self.forget_departed(&agents);

        let strategy =
            Self::determine_strategy(agents.len(), rayon::current_num_threads(), &self.config);

        let plans: Vec<AgentPlan> = match strategy {
            ExecutionStrategy::Sequential => agents
                .iter()
                .map(|&(snake, head)| self.plan_agent(&grid, snake, head, &deadline))
                .collect(),
            ExecutionStrategy::Parallel => agents
                .par_iter()
                .map(|&(snake, head)| self.plan_agent(&grid, snake, head, &deadline))
                .collect(),
        };

        let plan = TickPlan {
            turn: state.turn,
            plans,
            strategy,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Turn {}: planned {} snakes ({:?}, {} degraded, {} hazards, {} targets, {}ms)",
            plan.turn,
            plan.plans.len(),
            plan.strategy,
            plan.degraded_count(),
            grid.hazard_count(),
            grid.valued().len(),
            plan.elapsed.as_millis()
        );

        Ok(plan)
    }

    /// Determines the execution strategy based on agent count and hardware
    pub fn determine_strategy(num_agents: usize, num_cpus: usize, config: &Config) -> ExecutionStrategy {
        match (num_agents, num_cpus) {
            (n, cpus)
                if n >= config.strategy.min_agents_for_parallel
                    && cpus >= config.strategy.min_cpus_for_parallel =>
            {
                ExecutionStrategy::Parallel
            }
            _ => ExecutionStrategy::Sequential,
        }
    }

    fn plan_agent(&self, grid: &Grid, snake: &Snake, head: Cell, deadline: &Deadline) -> AgentPlan {
        let target = self.selector.select(grid, &head);

        let reused = match target {
            Some(target) if self.config.search.reuse_paths => {
                self.try_reuse(grid, &snake.id, head, target.cell)
            }
            _ => None,
        };

        let decision = match reused {
            Some(decision) => decision,
            None => FallbackDirector::new(&self.engine).decide(
                grid,
                head,
                target.map(|t| t.cell),
                deadline,
            ),
        };

        self.searches.fetch_add(decision.searches, Ordering::AcqRel);
        self.remember(&snake.id, &decision);
        Self::log_decision(&snake.id, head, &decision);

        AgentPlan {
            id: snake.id.clone(),
            decision,
        }
    }

    /// Keeps last tick's path if it still leads to `target` from `head` over safe cells
    fn try_reuse(&self, grid: &Grid, id: &str, head: Cell, target: Cell) -> Option<Decision> {
        let memory = self.memory.lock();
        let previous = memory.get(id)?;
        if previous.target != target {
            return None;
        }

        let path = previous.path.suffix_from(&head)?;
        if path.is_empty() || !path.cells()[1..].iter().all(|c| grid.is_safe(c)) {
            return None;
        }

        Some(Decision {
            direction: path.first_step()?,
            path,
            outcome: PlanOutcome::Reused,
            target: Some(target),
            searches: 0,
            target_search: None,
        })
    }

    fn remember(&self, id: &str, decision: &Decision) {
        let mut memory = self.memory.lock();
        match decision.target {
            Some(target) => {
                memory.insert(
                    id.to_string(),
                    PlanMemory {
                        target,
                        path: decision.path.clone(),
                    },
                );
            }
            None => {
                memory.remove(id);
            }
        }
    }

    fn forget_departed(&self, agents: &[(&Snake, Cell)]) {
        let alive: HashSet<&str> = agents.iter().map(|(snake, _)| snake.id.as_str()).collect();
        self.memory.lock().retain(|id, _| alive.contains(id.as_str()));
    }

    fn log_decision(id: &str, head: Cell, decision: &Decision) {
        match decision.outcome {
            PlanOutcome::Targeted | PlanOutcome::Reused => info!(
                "Snake {}: {} toward {} via {} ({} moves, {})",
                id,
                decision.direction.as_str(),
                decision.target.map(|t| t.to_string()).unwrap_or_default(),
                head,
                decision.path.len(),
                decision.outcome.as_str()
            ),
            PlanOutcome::Centering | PlanOutcome::CenterStep | PlanOutcome::SafeStep => warn!(
                "Snake {}: {} from {} ({}, target search: {})",
                id,
                decision.direction.as_str(),
                head,
                decision.outcome.as_str(),
                decision.target_search.unwrap_or("none")
            ),
            PlanOutcome::DefaultForward => error!(
                "Snake {}: boxed in at {}, defaulting to {}",
                id,
                head,
                decision.direction.as_str()
            ),
        }
    }
}
