// Tick scheduling
//
// The server reports how long the current tick still runs. That figure is turned
// into an absolute instant once, when the response arrives, and every planner in
// the tick reads the same value.

use std::time::{Duration, Instant};

/// Wall-clock instant after which planning must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Deadline { at: Some(instant) }
    }

    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }

    /// A deadline that never expires (offline replay and tests)
    pub fn never() -> Self {
        Deadline { at: None }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        match self.at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.at
    }
}

/// Deadlines of a single tick
#[derive(Debug, Clone, Copy)]
pub struct TickScheduler {
    started: Instant,
    tick_deadline: Instant,
    planning_deadline: Instant,
}

impl TickScheduler {
    /// Starts a tick that ends `tick_remain_ms` from now; planning stops `margin` earlier
    pub fn start(tick_remain_ms: u64, margin: Duration) -> Self {
        Self::start_at(Instant::now(), tick_remain_ms, margin)
    }

    pub fn start_at(now: Instant, tick_remain_ms: u64, margin: Duration) -> Self {
        let tick_deadline = now + Duration::from_millis(tick_remain_ms);
        let planning_deadline = tick_deadline.checked_sub(margin).unwrap_or(now).max(now);
        TickScheduler {
            started: now,
            tick_deadline,
            planning_deadline,
        }
    }

    /// Deadline handed to every planner of this tick
    pub fn planning_deadline(&self) -> Deadline {
        Deadline::at(self.planning_deadline)
    }

    pub fn tick_deadline(&self) -> Deadline {
        Deadline::at(self.tick_deadline)
    }

    /// True once the next tick has begun and a request may be sent
    pub fn is_new_tick(&self) -> bool {
        Instant::now() >= self.tick_deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Suspends until the tick deadline has passed
    pub async fn wait_for_next_tick(&self) {
        tokio::time::sleep_until(tokio::time::Instant::from_std(self.tick_deadline)).await;
    }
}
