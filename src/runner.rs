// Tick loop
//
// One iteration per tick:
//   send moves -> receive state -> plan on a blocking thread -> publish -> wait for the next tick
// Nothing is sent before the current tick's deadline has passed.

use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::client::{submit_with_retry, Transport};
use crate::debug_logger::DebugLogger;
use crate::frames::{FrameStore, RenderFrame};
use crate::planner::{Planner, TickPlan};
use crate::scheduler::TickScheduler;
use crate::types::{GameState, MoveRequest};

/// Drives the planner against the game server
pub struct Runner {
    planner: Arc<Planner>,
    transport: Arc<dyn Transport>,
    frames: Arc<FrameStore>,
    logger: DebugLogger,
}

impl Runner {
    pub fn new(
        planner: Arc<Planner>,
        transport: Arc<dyn Transport>,
        frames: Arc<FrameStore>,
        logger: DebugLogger,
    ) -> Self {
        Runner {
            planner,
            transport,
            frames,
            logger,
        }
    }

    /// Runs until the process exits
    pub async fn run(&self) {
        self.run_ticks(None).await;
    }

    /// Runs `limit` ticks (forever when `None`) and returns the last request built
    pub async fn run_ticks(&self, limit: Option<usize>) -> MoveRequest {
        let timing = self.planner.config().timing.clone();
        let mut request = MoveRequest::empty();
        let mut ticks = 0usize;

        while limit.map_or(true, |limit| ticks < limit) {
            ticks += 1;

            let response =
                submit_with_retry(self.transport.clone(), &request, timing.retry_backoff()).await;
            let received = Instant::now();

            let state = match GameState::from_value(response) {
                Ok(state) => state,
                Err(e) => {
                    error!("Skipping tick: {}", e);
                    request = MoveRequest::empty();
                    // No tick deadline is known; the backoff stands in for it
                    tokio::time::sleep(timing.retry_backoff()).await;
                    continue;
                }
            };

            for server_error in &state.errors {
                warn!("Turn {}: server reported: {}", state.turn, server_error);
            }

            let scheduler =
                TickScheduler::start_at(received, state.tick_remain_ms, timing.planning_margin());

            match self.plan(state, &scheduler).await {
                Some((state, plan)) => {
                    request = plan.to_request();
                    self.frames.publish(RenderFrame::build(&state, Some(&plan)));
                    self.logger.log_tick(state, &plan);
                }
                None => request = MoveRequest::empty(),
            }

            scheduler.wait_for_next_tick().await;
        }

        request
    }

    /// Plans on a blocking thread; `None` when the tick has to be skipped
    async fn plan(&self, state: GameState, scheduler: &TickScheduler) -> Option<(GameState, TickPlan)> {
        let planner = self.planner.clone();
        let deadline = scheduler.planning_deadline();

        let joined = tokio::task::spawn_blocking(move || {
            let result = planner.plan_tick(&state, deadline);
            (state, result)
        })
        .await;

        match joined {
            Ok((state, Ok(plan))) => {
                if scheduler.is_new_tick() {
                    warn!(
                        "Turn {}: planning finished after the tick ended ({}ms)",
                        plan.turn,
                        scheduler.elapsed().as_millis()
                    );
                } else {
                    info!(
                        "Turn {}: {} moves ready after {}ms",
                        plan.turn,
                        plan.plans.len(),
                        scheduler.elapsed().as_millis()
                    );
                }
                Some((state, plan))
            }
            Ok((state, Err(e))) => {
                error!("Turn {}: snapshot rejected: {}", state.turn, e);
                None
            }
            Err(e) => {
                error!("Planning task failed: {}", e);
                None
            }
        }
    }
}
