// Replay module for analyzing recorded ticks
//
// This module provides functionality to:
// 1. Parse JSONL tick logs written by the debug logger
// 2. Re-plan every recorded tick with the current configuration
// 3. Compare the recorded moves against the replayed ones

use log::{info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::debug_logger::{LoggedMove, TickLogEntry};
use crate::fallback::PlanOutcome;
use crate::planner::Planner;
use crate::scheduler::Deadline;
use crate::types::Direction;

/// A single snake's replayed move
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayedMove {
    pub id: String,
    pub direction: Direction,
    pub outcome: PlanOutcome,
}

/// Result of replaying a single tick
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u64,
    pub original: Vec<LoggedMove>,
    pub replayed: Vec<ReplayedMove>,
    pub matches: bool,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing tick logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<TickLogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: TickLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays ticks in order with one planner, so path reuse behaves as it did live
    ///
    /// Only entries whose turn is in `turns` are reported (all when `None`), but every
    /// earlier entry is still planned to rebuild the planner's path memory.
    pub fn replay_entries(
        &self,
        entries: &[TickLogEntry],
        turns: Option<&[u64]>,
    ) -> Result<Vec<ReplayResult>, String> {
        let planner = Planner::new(self.config.clone());
        let mut results = Vec::new();

        for entry in entries {
            let result = self.replay_tick(&planner, entry)?;
            let wanted = turns.map_or(true, |t| t.contains(&entry.turn));
            if !wanted {
                continue;
            }

            if self.verbose {
                self.print_result(&result);
            }
            if !result.matches {
                warn!("Turn {}: replay diverged from recorded moves", result.turn);
            }
            results.push(result);
        }

        Ok(results)
    }

    /// Re-plans a single tick without a deadline
    pub fn replay_tick(&self, planner: &Planner, entry: &TickLogEntry) -> Result<ReplayResult, String> {
        let start_time = Instant::now();
        let plan = planner
            .plan_tick(&entry.state, Deadline::never())
            .map_err(|e| format!("Turn {}: {}", entry.turn, e))?;

        let replayed: Vec<ReplayedMove> = plan
            .plans
            .iter()
            .map(|agent| ReplayedMove {
                id: agent.id.clone(),
                direction: agent.decision.direction,
                outcome: agent.decision.outcome,
            })
            .collect();

        let recorded: HashMap<&str, Direction> = entry
            .moves
            .iter()
            .map(|m| (m.id.as_str(), m.direction))
            .collect();
        let matches = replayed.len() == recorded.len()
            && replayed
                .iter()
                .all(|m| recorded.get(m.id.as_str()) == Some(&m.direction));

        Ok(ReplayResult {
            turn: entry.turn,
            original: entry.moves.clone(),
            replayed,
            matches,
            computation_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Computes statistics from replay results
    pub fn compute_stats(results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            matches as f64 / total_turns as f64
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    fn print_result(&self, result: &ReplayResult) {
        let status = if result.matches { "MATCH" } else { "DIFF " };
        println!(
            "[{}] Turn {:4} ({}ms)",
            status, result.turn, result.computation_time_ms
        );
        for replayed in &result.replayed {
            let original = result
                .original
                .iter()
                .find(|m| m.id == replayed.id)
                .map(|m| format!("{} ({})", m.direction.as_str(), m.outcome.as_str()))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "    {:<24} recorded {:<20} replayed {} ({})",
                replayed.id,
                original,
                replayed.direction.as_str(),
                replayed.outcome.as_str()
            );
        }
    }
}
